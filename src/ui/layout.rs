// src/ui/layout.rs
//! Layout computation for the UI panels.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of the collapsed controls strip.
const COLLAPSED_HEIGHT: u16 = 7;

/// Computed layout areas for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedLayout {
    /// Scene pane, including its border
    pub visualizer: Rect,
    /// Catalog list, hidden while collapsed
    pub tracks: Option<Rect>,
    pub player: Rect,
    /// Mode and theme selectors, hidden while collapsed
    pub visual_controls: Option<Rect>,
    /// Mood bars and phrase, hidden while collapsed
    pub insights: Option<Rect>,
}

/// Split the screen: visualizer on top, controls below.
pub fn compute_layout(area: Rect, controls_expanded: bool) -> ComputedLayout {
    let controls_height = if controls_expanded {
        Constraint::Percentage(45)
    } else {
        Constraint::Length(COLLAPSED_HEIGHT)
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), controls_height])
        .split(area);
    let (visualizer, controls) = (rows[0], rows[1]);

    if !controls_expanded {
        return ComputedLayout {
            visualizer,
            tracks: None,
            player: controls,
            visual_controls: None,
            insights: None,
        };
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(controls);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)])
        .split(columns[2]);

    ComputedLayout {
        visualizer,
        tracks: Some(columns[0]),
        player: columns[1],
        visual_controls: Some(right[0]),
        insights: Some(right[1]),
    }
}
