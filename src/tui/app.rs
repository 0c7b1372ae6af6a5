//! # TUI Application Core
//!
//! Chat session plus the terminal-only state around it: focus, persona
//! cursor, input buffer and transcript scroll.

use crate::core::error::SessionError;
use crate::features::completion::StreamEvent;
use crate::features::conversation::Message;
use crate::features::personas::PersonaRegistry;
use crate::features::session::{ChatSession, StreamProgress};
use crate::tui::event::KeyAction;
use log::debug;
use std::sync::Arc;

/// Lines moved per PageUp/PageDown
const SCROLL_STEP: u16 = 5;

/// Which pane receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Personas,
    Input,
}

/// Main application state
pub struct App {
    /// The chat session being displayed
    pub session: ChatSession,
    /// Model name shown in the status bar
    pub model: String,
    pub focus: Focus,
    /// Highlighted row in the persona list
    pub persona_cursor: usize,
    /// Input buffer for text entry
    pub input_buffer: String,
    /// Rows scrolled back from the bottom of the transcript
    pub scroll_back: u16,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Error message to display
    pub error_message: Option<String>,
    /// Status message to display
    pub status_message: Option<String>,
}

impl App {
    /// Create the app with the first persona already selected, as a fresh
    /// page would show its default choice.
    pub fn new(registry: Arc<PersonaRegistry>, model: impl Into<String>) -> Result<Self, SessionError> {
        let first = registry.ids().first().cloned().ok_or(SessionError::NoActivePersona)?;
        let mut session = ChatSession::new(registry);
        session.select_persona(&first)?;

        Ok(App {
            session,
            model: model.into(),
            focus: Focus::Input,
            persona_cursor: 0,
            input_buffer: String::new(),
            scroll_back: 0,
            should_quit: false,
            error_message: None,
            status_message: None,
        })
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn cursor_up(&mut self) {
        self.persona_cursor = self.persona_cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        let max = self.session.registry().len();
        if self.persona_cursor + 1 < max {
            self.persona_cursor += 1;
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Personas => Focus::Input,
            Focus::Input => Focus::Personas,
        };
    }

    /// Select the persona under the cursor
    pub fn select_persona_at_cursor(&mut self) {
        let Some(id) = self.session.registry().ids().get(self.persona_cursor).cloned() else {
            return;
        };

        match self.session.select_persona(&id) {
            Ok(true) => {
                self.scroll_back = 0;
                self.focus = Focus::Input;
                let name = self
                    .session
                    .active_persona()
                    .map(|p| p.name.clone())
                    .unwrap_or(id);
                self.status_message = Some(format!("Now talking with {name}"));
            }
            Ok(false) => {
                self.focus = Focus::Input;
            }
            Err(e) => {
                self.sync_cursor_to_active();
                self.error_message = Some(e.to_string());
            }
        }
    }

    /// Move the persona cursor back onto the active persona
    fn sync_cursor_to_active(&mut self) {
        let Some(active) = self.session.conversation().map(|c| c.persona_id().to_string()) else {
            return;
        };
        if let Some(index) = self.session.registry().ids().iter().position(|id| *id == active) {
            self.persona_cursor = index;
        }
    }

    pub fn input_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn input_backspace(&mut self) {
        self.input_buffer.pop();
    }

    /// Submit the input buffer. Returns the history to send when accepted.
    ///
    /// Blank input and submissions during streaming are refused and the
    /// buffer is left as typed.
    pub fn submit_input(&mut self) -> Option<Vec<Message>> {
        match self.session.submit(&self.input_buffer) {
            Ok(history) => {
                self.input_buffer.clear();
                self.scroll_back = 0;
                self.clear_error();
                self.clear_status();
                Some(history)
            }
            Err(SessionError::EmptyInput) => None,
            Err(e) => {
                self.error_message = Some(e.to_string());
                None
            }
        }
    }

    /// Apply an event from the completion stream
    pub fn handle_stream_event(&mut self, event: StreamEvent) {
        match self.session.apply(event) {
            StreamProgress::Failed => {
                if let Some(failed) = self.session.failed_reply() {
                    self.error_message = Some(failed.error.to_string());
                }
            }
            StreamProgress::Ignored => debug!("Stream event arrived with no reply pending"),
            StreamProgress::Continuing | StreamProgress::Completed => {}
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_back = self.scroll_back.saturating_add(SCROLL_STEP);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_back = self.scroll_back.saturating_sub(SCROLL_STEP);
    }

    /// Apply a key action. Returns the history to send when a message was submitted.
    pub fn handle_action(&mut self, action: KeyAction) -> Option<Vec<Message>> {
        match action {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::Up => self.cursor_up(),
            KeyAction::Down => self.cursor_down(),
            KeyAction::Select => self.select_persona_at_cursor(),
            KeyAction::ToggleFocus => self.toggle_focus(),
            KeyAction::Back => self.focus = Focus::Personas,
            KeyAction::Char(c) => self.input_char(c),
            KeyAction::Backspace => self.input_backspace(),
            KeyAction::Submit => return self.submit_input(),
            KeyAction::PageUp => self.scroll_up(),
            KeyAction::PageDown => self.scroll_down(),
            KeyAction::None => {}
        }
        None
    }
}
