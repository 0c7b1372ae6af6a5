//! # Transcript
//!
//! Visible history, the in-progress reply and the last failure, pinned to the
//! bottom unless the user scrolled back.

use crate::features::conversation::Role;
use crate::tui::app::App;
use crate::tui::ui::{persona_color, titled_block};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

/// Appended to the reply while it streams
const STREAMING_CURSOR: &str = "▌";

pub fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let lines = transcript_lines(app);

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2) as usize;
    let total = rendered_height(&lines, inner_width);

    let bottom = total.saturating_sub(inner_height);
    let offset = bottom.saturating_sub(app.scroll_back as usize);

    let title = if offset < bottom {
        format!("Transcript [{} more below]", bottom - offset)
    } else {
        "Transcript".to_string()
    };

    let paragraph = Paragraph::new(lines)
        .block(titled_block(&title))
        .wrap(Wrap { trim: false })
        .scroll((offset.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}

/// Lines for everything the user should see, system prompt excluded
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let (speaker, accent) = match app.session.active_persona() {
        Some(p) => (p.name.clone(), persona_color(p.color)),
        None => ("Assistant".to_string(), Color::Cyan),
    };
    let speaker_style = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    let user_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let mut lines = Vec::new();

    for message in app.session.visible_history() {
        let label = match message.role {
            Role::User => Span::styled("You", user_style),
            _ => Span::styled(speaker.clone(), speaker_style),
        };
        lines.push(Line::from(label));
        push_content(&mut lines, &message.content, Style::default());
        lines.push(Line::from(""));
    }

    if let Some(pending) = app.session.pending_reply() {
        lines.push(Line::from(Span::styled(speaker.clone(), speaker_style)));
        let text = format!("{}{STREAMING_CURSOR}", pending.text());
        push_content(&mut lines, &text, Style::default());
    } else if let Some(failed) = app.session.failed_reply() {
        lines.push(Line::from(vec![
            Span::styled(speaker.clone(), speaker_style),
            Span::styled(" [failed]", Style::default().fg(Color::Red)),
        ]));
        if !failed.partial.is_empty() {
            push_content(&mut lines, &failed.partial, Style::default().fg(Color::DarkGray));
        }
        lines.push(Line::from(Span::styled(
            format!("{} (send another message to try again)", failed.error),
            Style::default().fg(Color::Red),
        )));
    }

    lines
}

fn push_content(lines: &mut Vec<Line<'static>>, content: &str, style: Style) {
    for line in content.split('\n') {
        lines.push(Line::from(Span::styled(line.to_string(), style)));
    }
}

/// Rows `lines` occupy once word-wrapped at `width` columns, measured with
/// the same wrapper `render_transcript` draws with.
pub fn rendered_height(lines: &[Line<'static>], width: u16) -> usize {
    if width == 0 {
        return lines.len();
    }
    Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(width)
}
