pub mod app;
pub mod client;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod inputs;
pub mod io;

use app::{ui, App, AppReturn};
use eyre::Result;
use inputs::{events::Events, InputEvent};
use std::{io::stdout, sync::Arc, time::Duration};

/// Runs the terminal dashboard until the user quits.
pub async fn start_ui(app: &Arc<tokio::sync::Mutex<App>>) -> Result<()> {
    let mut stdout = stdout();
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = tui::backend::CrosstermBackend::new(stdout);
    let mut terminal = tui::Terminal::new(backend)?;
    terminal.clear()?;
    terminal.hide_cursor()?;

    let tick_rate = Duration::from_millis(200);
    let mut events = Events::new(tick_rate);

    // First load of the default section
    {
        let mut app = app.lock().await;
        app.refresh().await;
    }

    loop {
        {
            let app = app.lock().await;
            terminal.draw(|rect| ui::draw(rect, &app))?;
        }

        // The IO task needs the lock while we wait for input.
        let event = events.next().await;
        let mut app = app.lock().await;
        let result = match event {
            InputEvent::Input(key) => app.do_action(key).await,
            InputEvent::Tick => app.update_on_tick().await,
        };

        if result == AppReturn::Exit {
            events.close();
            break;
        }
    }

    terminal.clear()?;
    terminal.show_cursor()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    crossterm::terminal::disable_raw_mode()?;

    Ok(())
}
