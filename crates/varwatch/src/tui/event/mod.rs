//! Event handling for the TUI.
//!
//! Wraps crossterm events and adds a tick variant for periodic UI refresh.

use crate::listview::Direction;
use crate::tui::app::{App, Panel, PromptKind};
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyModifiers};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::interval;

/// Application-level event variants.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// Periodic tick for UI refresh.
    Tick,
}

/// Event handler that merges terminal input events with periodic ticks.
pub struct EventHandler {
    /// Tick interval duration.
    tick_rate: Duration,
}

impl EventHandler {
    /// Creates a new EventHandler with the specified tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Waits for the next event, returning either a terminal event or a tick.
    pub async fn next(&self, reader: &mut EventStream) -> std::io::Result<Event> {
        let mut tick = interval(self.tick_rate);
        // Consume the first immediate tick
        tick.tick().await;

        loop {
            tokio::select! {
                maybe_event = reader.next() => {
                    match maybe_event {
                        Some(Ok(CrosstermEvent::Key(key))) => return Ok(Event::Key(key)),
                        Some(Ok(CrosstermEvent::Resize(w, h))) => return Ok(Event::Resize(w, h)),
                        Some(Err(e)) => return Err(e),
                        // Mouse, focus and paste events are not used
                        Some(Ok(_)) => continue,
                        None => return Err(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "event stream ended",
                        )),
                    }
                }
                _ = tick.tick() => {
                    return Ok(Event::Tick);
                }
            }
        }
    }
}

/// Action produced by handling a key event.
///
/// Anything that needs the network or the clipboard is returned to the event
/// loop; pure state changes are applied to the [`App`] directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action to take.
    None,
    /// Quit the application.
    Quit,
    /// Run a snippet in the kernel.
    Execute(String),
    /// Rebind the daemon to another kernel.
    SwitchKernel(String),
    /// Put text on the clipboard.
    Copy(String),
    /// Drop the Broadcast feed and subscribe again.
    Reconnect,
}

/// Handles a key event by dispatching to the appropriate app method or action.
///
/// While a prompt is open every key edits the prompt, so letters such as `q`
/// can be typed into a filter.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if app.prompt.is_some() {
        return handle_prompt_key(app, key);
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.navigate(Direction::Down);
            Action::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.navigate(Direction::Up);
            Action::None
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
            app.navigate(Direction::Left);
            Action::None
        }
        KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
            app.navigate(Direction::Right);
            Action::None
        }
        KeyCode::Char('t') => {
            app.toggle_sort();
            Action::None
        }
        KeyCode::Char('f') => {
            app.open_prompt(PromptKind::Filter);
            Action::None
        }
        KeyCode::Char('/') => {
            app.open_prompt(PromptKind::Search);
            Action::None
        }
        KeyCode::Char(':') => {
            app.open_prompt(PromptKind::Execute);
            Action::None
        }
        KeyCode::Char('n') => {
            app.search_next();
            Action::None
        }
        KeyCode::Char('K') => {
            app.toggle_kernel_panel();
            Action::None
        }
        KeyCode::Enter if app.panel == Panel::Kernels => match app.selected_key() {
            Some(reference) => Action::SwitchKernel(reference.to_string()),
            None => Action::None,
        },
        KeyCode::Char('y') => match app.selected_key() {
            Some(key) => Action::Copy(key.to_string()),
            None => Action::None,
        },
        KeyCode::Char('r') => Action::Reconnect,
        KeyCode::Esc => {
            app.clear_search_or_leave_panel();
            Action::None
        }
        _ => Action::None,
    }
}

/// Edits the open prompt. Enter submits, Esc cancels.
fn handle_prompt_key(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc => {
            app.prompt = None;
            Action::None
        }
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Backspace => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.input.pop();
            }
            Action::None
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.input.push(c);
            }
            Action::None
        }
        _ => Action::None,
    }
}
