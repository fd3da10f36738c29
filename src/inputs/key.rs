use std::fmt::{self, Display, Formatter};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Represents an key.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum Key {
    Enter,
    Tab,
    BackTab,
    Backspace,
    Esc,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Char(char),
    Ctrl(char),
    Unknown,
}

impl Key {
    /// The character typed, for keys that insert text.
    pub fn get_char(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            _ => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Key::Char(' ') => write!(f, "<Space>"),
            Key::Char(c) => write!(f, "<{}>", c),
            Key::Ctrl(c) => write!(f, "<Ctrl+{}>", c),
            Key::BackTab => write!(f, "<Shift+Tab>"),
            Key::PageUp => write!(f, "<PgUp>"),
            Key::PageDown => write!(f, "<PgDn>"),
            _ => write!(f, "<{:?}>", self),
        }
    }
}

impl From<KeyEvent> for Key {
    fn from(key_event: KeyEvent) -> Self {
        match key_event {
            KeyEvent {
                code: KeyCode::Esc, ..
            } => Key::Esc,
            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => Key::Backspace,
            KeyEvent {
                code: KeyCode::Left,
                ..
            } => Key::Left,
            KeyEvent {
                code: KeyCode::Right,
                ..
            } => Key::Right,
            KeyEvent {
                code: KeyCode::Up, ..
            } => Key::Up,
            KeyEvent {
                code: KeyCode::Down,
                ..
            } => Key::Down,
            KeyEvent {
                code: KeyCode::PageUp,
                ..
            } => Key::PageUp,
            KeyEvent {
                code: KeyCode::PageDown,
                ..
            } => Key::PageDown,
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => Key::Enter,
            KeyEvent {
                code: KeyCode::Tab, ..
            } => Key::Tab,
            KeyEvent {
                code: KeyCode::BackTab,
                ..
            } => Key::BackTab,
            KeyEvent {
                code: KeyCode::Char(c),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => Key::Ctrl(c),
            KeyEvent {
                code: KeyCode::Char(c),
                ..
            } => Key::Char(c),
            _ => Key::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_chars_are_not_text() {
        let key = Key::from(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(key, Key::Ctrl('c'));
        assert_eq!(key.get_char(), None);

        let key = Key::from(KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT));
        assert_eq!(key.get_char(), Some('P'));
    }
}
