// src/ui/widgets/mod.rs
//! Custom widgets for the neurobeats UI.

pub mod insights;
pub mod player_panel;
pub mod track_list;
pub mod visual_controls;
pub mod visualizer;

// Re-export widget rendering functions
pub use insights::render_insights;
pub use player_panel::{render_player_panel, MicIndicator, PlayerView};
pub use track_list::render_track_list;
pub use visual_controls::render_visual_controls;
pub use visualizer::{render_visualizer, visualizer_block};
