// src/ui/widgets/track_list.rs
//! Catalog track list widget.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::catalog::Track;

/// Render the catalog, marking the loaded track.
pub fn render_track_list(
    f: &mut Frame<'_>,
    area: Rect,
    tracks: &[Track],
    current: Option<&Track>,
    playing: bool,
    state: &mut ListState,
) {
    let items: Vec<ListItem> = tracks
        .iter()
        .map(|track| {
            let is_current = current.is_some_and(|c| c.id == track.id);
            let marker = match (is_current, playing) {
                (true, true) => Span::styled("♪ ", Style::default().fg(Color::Green)),
                (true, false) => Span::styled("‖ ", Style::default().fg(Color::Yellow)),
                _ => Span::raw("  "),
            };
            ListItem::new(Line::from(vec![
                marker,
                Span::styled(
                    track.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", track.artist),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("  {}", track.duration_label()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Tracks"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, area, state);
}
