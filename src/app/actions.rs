use std::collections::HashMap;
use std::fmt::{self, Display};
use std::slice::Iter;

use crate::inputs::key::Key;

/// We define all available action
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Action {
    Quit,
    NextSection,
    PreviousSection,
    Next,
    Previous,
    Refresh,
    ToggleRunning,
    Inspect,
    ShowLogs,
    ShowStats,
    ShowServices,
    Remove,
    Pull,
    Create,
    Prune,
    EditProjectDir,
    ComposeUp,
    ComposeDown,
    Close,
    ScrollUp,
    ScrollDown,
}

impl Action {
    /// All available actions
    pub fn iterator() -> Iter<'static, Action> {
        static ACTIONS: [Action; 21] = [
            Action::Quit,
            Action::NextSection,
            Action::PreviousSection,
            Action::Next,
            Action::Previous,
            Action::Refresh,
            Action::ToggleRunning,
            Action::Inspect,
            Action::ShowLogs,
            Action::ShowStats,
            Action::ShowServices,
            Action::Remove,
            Action::Pull,
            Action::Create,
            Action::Prune,
            Action::EditProjectDir,
            Action::ComposeUp,
            Action::ComposeDown,
            Action::Close,
            Action::ScrollUp,
            Action::ScrollDown,
        ];
        ACTIONS.iter()
    }

    /// List of key associated to action
    pub fn keys(&self) -> &[Key] {
        match self {
            Action::Quit => &[Key::Char('q'), Key::Ctrl('c')],
            Action::NextSection => &[Key::Tab, Key::Right],
            Action::PreviousSection => &[Key::BackTab, Key::Left],
            Action::Next => &[Key::Down, Key::Char('j')],
            Action::Previous => &[Key::Up, Key::Char('k')],
            Action::Refresh => &[Key::Char('r')],
            Action::ToggleRunning => &[Key::Char('s')],
            Action::Inspect => &[Key::Char('i'), Key::Enter],
            Action::ShowLogs => &[Key::Char('l')],
            Action::ShowStats => &[Key::Char('t')],
            Action::ShowServices => &[Key::Char('v')],
            Action::Remove => &[Key::Char('x')],
            Action::Pull => &[Key::Char('p')],
            Action::Create => &[Key::Char('c')],
            Action::Prune => &[Key::Char('P')],
            Action::EditProjectDir => &[Key::Char('d'), Key::Enter],
            Action::ComposeUp => &[Key::Char('u')],
            Action::ComposeDown => &[Key::Char('D')],
            Action::Close => &[Key::Esc, Key::Char('q')],
            Action::ScrollUp => &[Key::Up, Key::Char('k'), Key::PageUp],
            Action::ScrollDown => &[Key::Down, Key::Char('j'), Key::PageDown],
        }
    }
}

/// Could display a user friendly short description of action
impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            Action::Quit => "Quit",
            Action::NextSection => "Next Section",
            Action::PreviousSection => "Previous Section",
            Action::Next => "Next",
            Action::Previous => "Previous",
            Action::Refresh => "Refresh",
            Action::ToggleRunning => "Start/Stop",
            Action::Inspect => "Inspect",
            Action::ShowLogs => "Logs",
            Action::ShowStats => "Stats",
            Action::ShowServices => "Services",
            Action::Remove => "Remove",
            Action::Pull => "Pull",
            Action::Create => "Create",
            Action::Prune => "Prune",
            Action::EditProjectDir => "Project Dir",
            Action::ComposeUp => "Up",
            Action::ComposeDown => "Down",
            Action::Close => "Close",
            Action::ScrollUp => "Scroll Up",
            Action::ScrollDown => "Scroll Down",
        };
        match self.keys().first() {
            Some(key) => write!(f, "{} {}", key, str),
            None => write!(f, "{}", str),
        }
    }
}

/// The application should have some contextual actions.
#[derive(Default, Debug, Clone)]
pub struct Actions(Vec<Action>);

impl Actions {
    /// Given a key, find the corresponding action
    pub fn find(&self, key: Key) -> Option<&Action> {
        Action::iterator()
            .filter(|action| self.0.contains(action))
            .find(|action| action.keys().contains(&key))
    }

    /// Get contextual actions.
    /// (just for building a help view)
    pub fn actions(&self) -> &[Action] {
        self.0.as_slice()
    }
}

impl From<Vec<Action>> for Actions {
    /// Build contextual action
    ///
    /// # Panics
    ///
    /// If two actions have same key
    fn from(actions: Vec<Action>) -> Self {
        let mut map: HashMap<Key, Vec<Action>> = HashMap::new();
        for action in actions.iter() {
            for key in action.keys().iter() {
                map.entry(*key).or_default().push(*action);
            }
        }
        let errors = map
            .iter()
            .filter(|(_, actions)| actions.len() > 1)
            .map(|(key, actions)| {
                let actions = actions
                    .iter()
                    .map(Action::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Conflict key {} with actions {}", key, actions)
            })
            .collect::<Vec<_>>();
        if !errors.is_empty() {
            panic!("{}", errors.join("; "))
        }

        Self(actions)
    }
}

impl Display for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions = self
            .0
            .iter()
            .map(Action::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        write!(f, "{}", actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_find_action_by_key() {
        let actions: Actions = vec![Action::Quit, Action::Next].into();
        assert_eq!(actions.find(Key::Ctrl('c')), Some(&Action::Quit));
        assert_eq!(actions.find(Key::Char('j')), Some(&Action::Next));
    }

    #[test]
    fn should_find_action_by_key_not_defined() {
        let actions: Actions = vec![Action::Quit, Action::Next].into();
        assert_eq!(actions.find(Key::Char('x')), None);
    }

    #[test]
    fn shifted_letters_are_distinct_keys() {
        let actions: Actions = vec![Action::EditProjectDir, Action::ComposeDown].into();
        assert_eq!(actions.find(Key::Char('d')), Some(&Action::EditProjectDir));
        assert_eq!(actions.find(Key::Char('D')), Some(&Action::ComposeDown));
    }

    #[test]
    #[should_panic]
    fn should_panic_on_conflicting_keys() {
        let _: Actions = vec![Action::Quit, Action::Close].into();
    }

    #[test]
    fn help_lists_first_key() {
        let actions: Actions = vec![Action::Quit, Action::Refresh].into();
        assert_eq!(actions.to_string(), "<q> Quit | <r> Refresh");
    }
}
