//! Terminal input: keys, mouse and focus reported by crossterm.

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::common::constants::{HOT_CORNER_COLUMNS, HOT_CORNER_ROWS};
use crate::io::signals::BoardEvent;

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn in_hot_corner(column: u16, row: u16) -> bool {
    column < HOT_CORNER_COLUMNS && row < HOT_CORNER_ROWS
}

/// Translate a terminal event into a board event.
///
/// Holding `s` is only recognised when the terminal reports key releases;
/// otherwise a single tap would open the settings screen.
pub fn map_event(event: &Event, key_releases: bool) -> Option<BoardEvent> {
    match event {
        Event::FocusGained => Some(BoardEvent::Focus),
        Event::Key(key) => map_key(key, key_releases),
        Event::Mouse(mouse) => map_mouse(mouse),
        _ => None,
    }
}

fn map_key(key: &KeyEvent, key_releases: bool) -> Option<BoardEvent> {
    match (key.code, key.kind) {
        (KeyCode::Char('s') | KeyCode::Char('S'), KeyEventKind::Press) if key_releases => {
            Some(BoardEvent::HoldPress)
        }
        (KeyCode::Char('s') | KeyCode::Char('S'), KeyEventKind::Release) if key_releases => {
            Some(BoardEvent::HoldRelease)
        }
        (_, KeyEventKind::Press) => match key.code {
            KeyCode::Esc => Some(BoardEvent::Back),
            KeyCode::Char('q') => Some(BoardEvent::Shutdown),
            // Raw mode swallows SIGINT.
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(BoardEvent::Shutdown)
            }
            _ => None,
        },
        _ => None,
    }
}

fn map_mouse(mouse: &MouseEvent) -> Option<BoardEvent> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if in_hot_corner(mouse.column, mouse.row) => {
            Some(BoardEvent::HoldPress)
        }
        MouseEventKind::Up(MouseButton::Left) => Some(BoardEvent::HoldRelease),
        MouseEventKind::Drag(MouseButton::Left) if !in_hot_corner(mouse.column, mouse.row) => {
            Some(BoardEvent::HoldRelease)
        }
        _ => None,
    }
}

/// Read terminal events until `running` clears or the main loop goes away.
pub fn spawn_input_thread(sender: Sender<BoardEvent>, running: Arc<AtomicBool>, key_releases: bool) {
    thread::spawn(move || {
        while running.load(Ordering::SeqCst) {
            match event::poll(INPUT_POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    log_warning!("Terminal input unavailable: {e}");
                    return;
                }
            }

            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    log_warning!("Terminal input unavailable: {e}");
                    return;
                }
            };

            if let Some(board_event) = map_event(&event, key_releases)
                && sender.send(board_event).is_err()
            {
                return;
            }
        }
    });
}
