//! # TUI Event Handling
//!
//! Keyboard, tick and completion-stream events funnelled into one channel.

use crate::features::completion::{CompletionClient, StreamEvent};
use crate::features::conversation::Message;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// TUI events
#[derive(Debug)]
pub enum Event {
    /// Keyboard input
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Event from the in-flight completion stream
    Stream(StreamEvent),
    /// Tick for periodic redraws
    Tick,
}

/// Event handler that combines keyboard, stream, and tick events
pub struct EventHandler {
    /// Event receiver
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_rate: Duration) -> (Self, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn keyboard event handler
        let key_tx = tx.clone();
        std::thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            if key_tx.send(Event::Key(key)).is_err() {
                                break;
                            }
                        }
                        Ok(CrosstermEvent::Resize(w, h)) => {
                            if key_tx.send(Event::Resize(w, h)).is_err() {
                                break;
                            }
                        }
                        _ => {}
                    }
                } else {
                    // Send tick on poll timeout
                    if key_tx.send(Event::Tick).is_err() {
                        break;
                    }
                }
            }
        });

        (EventHandler { rx }, tx)
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Stream a completion for `history` and forward its events, in order, as
/// `Event::Stream`. A stream that fails to open is forwarded as a single
/// `StreamEvent::Failed`.
pub fn spawn_completion(
    client: Arc<dyn CompletionClient>,
    history: Vec<Message>,
    tx: mpsc::UnboundedSender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = match client.stream_completion(&history).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = tx.send(Event::Stream(StreamEvent::Failed(e)));
                return;
            }
        };

        while let Some(event) = stream.next().await {
            if tx.send(Event::Stream(event)).is_err() {
                debug!("UI event channel closed; abandoning completion stream");
                break;
            }
        }
    })
}

/// Key action result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// No action
    None,
    /// Quit the application
    Quit,
    /// Move persona cursor up
    Up,
    /// Move persona cursor down
    Down,
    /// Select persona under the cursor
    Select,
    /// Switch focus between the persona list and the input box
    ToggleFocus,
    /// Leave the input box
    Back,
    /// Character input
    Char(char),
    /// Backspace
    Backspace,
    /// Send the typed message
    Submit,
    /// Scroll transcript back
    PageUp,
    /// Scroll transcript forward
    PageDown,
}

/// Map a key event to an action
pub fn map_key_event(key: KeyEvent, input_focused: bool) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => return KeyAction::ToggleFocus,
        KeyCode::PageUp => return KeyAction::PageUp,
        KeyCode::PageDown => return KeyAction::PageDown,
        _ => {}
    }

    if input_focused {
        match key.code {
            KeyCode::Esc => KeyAction::Back,
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::Backspace => KeyAction::Backspace,
            KeyCode::Char(c) => KeyAction::Char(c),
            _ => KeyAction::None,
        }
    } else {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::Up,
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => KeyAction::Down,
            (KeyCode::Enter, _) | (KeyCode::Char(' '), KeyModifiers::NONE) => KeyAction::Select,
            (KeyCode::Char('i'), KeyModifiers::NONE) => KeyAction::ToggleFocus,
            _ => KeyAction::None,
        }
    }
}
