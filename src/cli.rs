use std::path::PathBuf;

use clap::Parser;

use crate::scene::{SceneKind, Theme};

#[derive(Parser, Debug)]
#[command(name = "neurobeats", about = "Terminal music visualizer with live audio analysis")]
pub struct Cli {
    /// Config file (defaults to ./neurobeats.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Colour theme
    #[arg(short, long, value_enum)]
    pub theme: Option<Theme>,

    /// Visual mode shown at startup
    #[arg(short, long, value_enum)]
    pub mode: Option<SceneKind>,

    /// Frames per second for the scene and the analyser
    #[arg(long)]
    pub fps: Option<u32>,

    /// Seed for particle placement and insight phrases
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log file; the terminal itself belongs to the UI
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Track catalog (TOML with [[tracks]] entries)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Print the track catalog and exit
    #[arg(long)]
    pub list_tracks: bool,
}

impl Cli {
    /// Log file used when `--log-file` is not given.
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("neurobeats.log"))
    }
}
