// src/ui/tui.rs
//! Terminal setup and the cooperative run loop.

use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::Result;
use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use crate::app::App;

/// Longest the loop sleeps when nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Take over the terminal and run `app` until it asks to quit.
pub fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, &mut app);

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        let now = Instant::now();
        let size = terminal.size()?;
        app.resize(Rect::new(0, 0, size.width, size.height), now);
        app.update(now);
        terminal.draw(|f| app.draw(f, now))?;

        // Sleep until the next chain is due or a key arrives
        let timeout = app
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL);

        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if app.on_key(key, Instant::now()) {
                    log::info!("quit requested");
                    return Ok(());
                }
            }
        }
    }
}
