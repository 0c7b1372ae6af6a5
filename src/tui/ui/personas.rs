//! # Persona Selector
//!
//! Left-hand list of personas; the active one is marked, the cursor is
//! highlighted while the list has focus.

use crate::tui::app::{App, Focus};
use crate::tui::ui::{persona_color, titled_block};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};

pub fn render_personas(frame: &mut Frame, app: &App, area: Rect) {
    let active_id = app.session.active_persona().map(|p| p.id.clone());
    let personas = app.session.registry().list_personas();

    let items: Vec<ListItem> = personas
        .iter()
        .map(|p| {
            let is_active = active_id.as_deref() == Some(p.id.as_str());
            let marker = if is_active { "● " } else { "  " };
            let style = if is_active {
                Style::default()
                    .fg(persona_color(p.color))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![Span::styled(marker, style), Span::styled(p.name.clone(), style)]))
        })
        .collect();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(area);

    let focused = app.focus == Focus::Personas;
    let title = if focused { "Personas [active]" } else { "Personas" };
    let highlight = if focused {
        Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(titled_block(title))
        .highlight_style(highlight)
        .highlight_symbol(if focused { ">" } else { " " });

    let mut state = ListState::default().with_selected(Some(app.persona_cursor));
    frame.render_stateful_widget(list, layout[0], &mut state);

    // Description of the persona under the cursor
    let description = personas
        .get(app.persona_cursor)
        .map(|p| p.description.clone())
        .unwrap_or_default();
    let about = Paragraph::new(description)
        .block(titled_block("About"))
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    frame.render_widget(about, layout[1]);
}
