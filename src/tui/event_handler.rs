use super::app_logic::TuiApp;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::Duration;

// Short poll so finished requests show up without a key press.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(super) fn handle_events(app: &mut TuiApp) -> Result<()> {
    if event::poll(POLL_INTERVAL)? {
        if let Event::Key(key_event) = event::read()? {
            if key_event.kind == KeyEventKind::Press {
                app.handle_key(key_event);
            }
        }
    }
    Ok(())
}
