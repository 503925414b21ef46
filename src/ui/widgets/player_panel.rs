// src/ui/widgets/player_panel.rs
//! Player information panel widget.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::catalog::Track;

/// Microphone state as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicIndicator<'a> {
    Off,
    Pending,
    Live(&'a str),
}

/// Everything the player panel shows.
pub struct PlayerView<'a> {
    pub track: Option<&'a Track>,
    pub playing: bool,
    pub mic: MicIndicator<'a>,
    pub volume: f32,
    pub elapsed: u64,
    /// Last error or notice, if any.
    pub status: Option<&'a str>,
}

/// Render the player information panel.
pub fn render_player_panel(f: &mut Frame<'_>, area: Rect, view: &PlayerView<'_>) {
    f.render_widget(Block::default().borders(Borders::ALL).title("Player"), area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let mut lines = Vec::new();
    match (view.mic, view.track) {
        (MicIndicator::Live(device), _) => {
            lines.push(Line::from(Span::styled(
                "Live microphone",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                device.to_string(),
                Style::default().fg(Color::Gray),
            )));
        }
        (_, Some(track)) => {
            lines.push(Line::from(Span::styled(
                track.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                track.artist.clone(),
                Style::default().fg(Color::Gray),
            )));
            if let Some(mood) = track.mood {
                lines.push(Line::from(format!(
                    "energetic {:.0}%  calm {:.0}%  dark {:.0}%  euphoric {:.0}%",
                    mood.energetic * 100.0,
                    mood.calm * 100.0,
                    mood.dark * 100.0,
                    mood.euphoric * 100.0
                )));
            }
        }
        (_, None) => lines.push(Line::from("No track selected")),
    }
    if let Some(status) = view.status {
        lines.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner[0]);

    // Playback controls
    let play_pause_icon = if view.playing {
        Span::styled(" ⏸ ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" ⏵ ", Style::default().fg(Color::Yellow))
    };
    let mic_icon = match view.mic {
        MicIndicator::Off => Span::styled(" mic off ", Style::default().fg(Color::Gray)),
        MicIndicator::Pending => Span::styled(" mic … ", Style::default().fg(Color::Yellow)),
        MicIndicator::Live(_) => Span::styled(" mic on ", Style::default().fg(Color::Red)),
    };
    let controls = Line::from(vec![play_pause_icon, Span::raw(" "), mic_icon]);
    f.render_widget(
        Paragraph::new(controls).alignment(Alignment::Center),
        inner[1],
    );

    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(f64::from(view.volume).clamp(0.0, 1.0))
            .label(format!("Volume {:.0}%", view.volume * 100.0)),
        inner[2],
    );

    // Progress bar with time display
    let (ratio, time_label) = match (view.mic, view.track) {
        (MicIndicator::Live(_), _) | (_, None) => (0.0, "--:-- / --:--".to_string()),
        (_, Some(track)) => {
            let duration = track.duration.max(1);
            let elapsed = view.elapsed.min(duration);
            (
                (elapsed as f64 / duration as f64).clamp(0.0, 1.0),
                format!(
                    "{:02}:{:02} / {}",
                    elapsed / 60,
                    elapsed % 60,
                    track.duration_label()
                ),
            )
        }
    };
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC))
            .ratio(ratio)
            .label(time_label),
        inner[3],
    );
}
