// src/ui/widgets/visual_controls.rs
//! Visual mode and theme selectors.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::scene::{SceneKind, Theme};
use crate::ui::trail::rgb_color;

pub fn render_visual_controls(f: &mut Frame<'_>, area: Rect, mode: SceneKind, theme: Theme) {
    let selected = Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD);

    let mut modes = vec![Span::raw("Mode   ")];
    for (i, kind) in SceneKind::ALL.into_iter().enumerate() {
        let style = if kind == mode { selected } else { Style::default() };
        modes.push(Span::styled(format!(" {} {} ", i + 1, kind.name()), style));
    }

    let mut themes = vec![Span::raw("Theme  ")];
    for t in Theme::ALL {
        let style = if t == theme { selected } else { Style::default() };
        themes.push(Span::styled(format!(" {} ", t.name()), style));
    }

    let swatch: Vec<Span> = std::iter::once(Span::raw("       "))
        .chain(
            theme
                .palette()
                .iter()
                .map(|&c| Span::styled("██ ", Style::default().fg(rgb_color(c)))),
        )
        .collect();

    let help = Line::from(Span::styled(
        "space play  ↑↓/enter track  m mic  +/- vol  v mode  t theme  c controls  q quit",
        Style::default().fg(Color::DarkGray),
    ));

    f.render_widget(
        Paragraph::new(vec![Line::from(modes), Line::from(themes), Line::from(swatch), help])
            .block(Block::default().borders(Borders::ALL).title("Visual Controls")),
        area,
    );
}
