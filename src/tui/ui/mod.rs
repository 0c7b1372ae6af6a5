//! # TUI UI Components
//!
//! Ratatui-based rendering of the chat screen.

mod personas;
mod transcript;

pub use personas::render_personas;
pub use transcript::{rendered_height, render_transcript, transcript_lines};

use crate::features::session::Phase;
use crate::tui::app::{App, Focus};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Shown in the empty input box
const INPUT_PLACEHOLDER: &str = "시인에게 말을 걸어보세요...";
const HEADER_CAPTION: &str = "시인의 삶과 문학에 대해 자유롭게 이야기를 나누어보세요.";
/// Header title before any persona is active
const PERSONA_PROMPT: &str = "대화 상대를 선택하세요";

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(28), // Persona list
            Constraint::Min(0),     // Chat
        ])
        .split(chunks[0]);

    render_personas(frame, app, main_chunks[0]);

    let chat_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Transcript
            Constraint::Length(3), // Input
        ])
        .split(main_chunks[1]);

    render_header(frame, app, chat_chunks[0]);
    render_transcript(frame, app, chat_chunks[1]);
    render_input(frame, app, chat_chunks[2]);

    render_status_bar(frame, app, chunks[1]);
}

/// Persona accent colour as a terminal colour
pub fn persona_color(color: u32) -> Color {
    Color::from_u32(color)
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Paragraph::new(header_lines(app)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

/// Title and caption above the transcript
pub fn header_lines(app: &App) -> Vec<Line<'static>> {
    let (title, accent) = match app.session.active_persona() {
        Some(p) => (format!("✒ {} 시인과의 대화", p.name), persona_color(p.color)),
        None => (format!("✒ {PERSONA_PROMPT}"), Color::White),
    };

    vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            HEADER_CAPTION,
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let streaming = app.session.is_streaming();
    let focused = app.focus == Focus::Input;

    let (title, style) = if streaming {
        (" Waiting for reply... ", Style::default().fg(Color::DarkGray))
    } else if focused {
        (" Message (Enter to send, Esc for personas) ", Style::default().fg(Color::Cyan))
    } else {
        (" Message (Tab to type) ", Style::default().fg(Color::White))
    };

    let content = if app.input_buffer.is_empty() && !focused {
        Line::from(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(app.input_buffer.as_str())
    };

    let input = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(style);
    frame.render_widget(input, area);

    if focused {
        // Display width, so wide (e.g. Hangul) characters place the cursor correctly
        let width = Line::from(app.input_buffer.as_str()).width() as u16;
        let max_x = area.x + area.width.saturating_sub(2);
        frame.set_cursor_position(Position::new(
            (area.x + 1 + width).min(max_x),
            area.y + 1,
        ));
    }
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let phase = match app.session.phase() {
        Phase::Idle => Span::styled("● Idle", Style::default().fg(Color::Gray)),
        Phase::AwaitingInput => Span::styled("● Ready", Style::default().fg(Color::Green)),
        Phase::Streaming => Span::styled("● Streaming...", Style::default().fg(Color::Yellow)),
    };

    let model = Span::styled(format!(" {} ", app.model), Style::default().fg(Color::Cyan));

    let help_hint = match app.focus {
        Focus::Personas => " ↑/↓:Move Enter:Select Tab:Type q:Quit ",
        Focus::Input => " Enter:Send Esc:Personas PgUp/PgDn:Scroll Ctrl+C:Quit ",
    };

    // Error or status message
    let message = if let Some(err) = &app.error_message {
        Span::styled(format!(" Error: {} ", err), Style::default().fg(Color::Red))
    } else if let Some(status) = &app.status_message {
        Span::styled(format!(" {} ", status), Style::default().fg(Color::Green))
    } else {
        Span::raw("")
    };

    let status_line = Line::from(vec![
        phase,
        Span::raw(" |"),
        model,
        Span::raw("|"),
        message,
        Span::styled(help_hint, Style::default().fg(Color::Black)),
    ]);

    let paragraph = Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

/// Helper to create a block with title
pub fn titled_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
}
