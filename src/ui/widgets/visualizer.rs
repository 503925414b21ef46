// src/ui/widgets/visualizer.rs
//! Visualizer pane: the scene canvas plus its overlays.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::scene::SceneKind;
use crate::ui::trail::TrailCanvas;

/// Block drawn around the scene. The canvas fills its inner area.
pub fn visualizer_block(mode: SceneKind) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(format!("Visualizer: {}", mode.name()))
}

/// Render the canvas, the mode/BPM badge and the analyzing banner.
pub fn render_visualizer(
    f: &mut Frame<'_>,
    area: Rect,
    trail: &TrailCanvas,
    mode: SceneKind,
    tempo: Option<u32>,
    analyzing: bool,
) {
    let block = visualizer_block(mode);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    f.render_widget(trail.widget(), inner);

    let mut badge = vec![Span::styled(
        format!(" {} ", mode.name()),
        Style::default().fg(Color::Black).bg(Color::Magenta),
    )];
    if let Some(bpm) = tempo {
        badge.push(Span::raw(" "));
        badge.push(Span::styled(
            format!(" {bpm} BPM "),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ));
    }
    let badge_area = Rect::new(inner.x, inner.y, inner.width, 1);
    f.render_widget(Paragraph::new(Line::from(badge)), badge_area);

    if analyzing && inner.height >= 3 {
        let text = "Analyzing audio…";
        let width = (text.chars().count() as u16 + 4).min(inner.width);
        let banner = Rect::new(
            inner.x + (inner.width - width) / 2,
            inner.y + inner.height / 2 - 1,
            width,
            3,
        );
        f.render_widget(Clear, banner);
        f.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::BOLD))
                .block(Block::default().borders(Borders::ALL)),
            banner,
        );
    }
}
