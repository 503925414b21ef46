// src/ui/widgets/insights.rs
//! Mood bars and the insight phrase.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::insight::MoodVector;
use crate::scene::Palette;
use crate::ui::trail::rgb_color;

pub fn render_insights(
    f: &mut Frame<'_>,
    area: Rect,
    mood: &MoodVector,
    phrase: &str,
    palette: &Palette,
    live: bool,
) {
    // A frozen mood is labelled as such
    let title = if live {
        "AI Insights · Real-time"
    } else {
        "AI Insights · Static"
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    for (i, (label, value)) in mood.axes().into_iter().enumerate() {
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(rgb_color(palette[i])))
                .ratio(f64::from(value).clamp(0.0, 1.0))
                .label(format!("{label} {:.0}%", value * 100.0)),
            rows[i],
        );
    }

    f.render_widget(
        Paragraph::new(phrase.to_string())
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true }),
        rows[4],
    );
}
