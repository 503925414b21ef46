//! Configuration: analyser settings, display settings and the track catalog.
//!
//! Values come from an optional `neurobeats.toml`; command line flags override
//! them in `main`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::{builtin_catalog, load_catalog, Track};
use crate::error::{Error, Result};
use crate::scene::{SceneKind, Theme};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "neurobeats.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Separate catalog file; takes precedence over inline `tracks`.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Inline catalog; the built-in one is used when empty.
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Samples per analysis window. Bin count is half of this.
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Temporal smoothing between analyser frames (0.0-1.0).
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_min_db")]
    pub min_db: f32,
    #[serde(default = "default_max_db")]
    pub max_db: f32,
    /// Ring buffer length for captured samples.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Opacity of the black overlay applied every frame.
    #[serde(default = "default_fade_alpha")]
    pub fade_alpha: f64,
    /// Trail items below this opacity are dropped.
    #[serde(default = "default_trail_cutoff")]
    pub trail_cutoff: f64,
    /// Virtual pixels per terminal cell, horizontally.
    #[serde(default = "default_cell_width")]
    pub cell_width: u16,
    /// Virtual pixels per terminal cell, vertically.
    #[serde(default = "default_cell_height")]
    pub cell_height: u16,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub mode: SceneKind,
    /// Seed for scene entity pools and the insight phrase picker.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_db: default_min_db(),
            max_db: default_max_db(),
            buffer_capacity: default_buffer_capacity(),
            volume: default_volume(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            fade_alpha: default_fade_alpha(),
            trail_cutoff: default_trail_cutoff(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            theme: Theme::default(),
            mode: SceneKind::default(),
            seed: None,
        }
    }
}

fn default_fft_size() -> usize { 256 }
fn default_smoothing() -> f32 { 0.8 }
fn default_min_db() -> f32 { -100.0 }
fn default_max_db() -> f32 { -30.0 }
fn default_buffer_capacity() -> usize { 16384 }
fn default_volume() -> f32 { 0.8 }
fn default_fps() -> u32 { 30 }
fn default_fade_alpha() -> f64 { 0.1 }
fn default_trail_cutoff() -> f64 { 0.25 }
fn default_cell_width() -> u16 { 8 }
fn default_cell_height() -> u16 { 16 }

impl Config {
    /// Reject settings the analyser or renderers cannot work with.
    pub fn validate(&self) -> Result<()> {
        let fft = self.audio.fft_size;
        if fft < 32 || !fft.is_power_of_two() {
            return Err(Error::InvalidSetting(format!(
                "fft_size must be a power of two >= 32, got {fft}"
            )));
        }
        if self.audio.buffer_capacity < fft {
            return Err(Error::InvalidSetting(format!(
                "buffer_capacity ({}) must hold at least one fft window ({fft})",
                self.audio.buffer_capacity
            )));
        }
        if self.audio.min_db >= self.audio.max_db {
            return Err(Error::InvalidSetting("min_db must be below max_db".into()));
        }
        if !(0.0..1.0).contains(&self.audio.smoothing) {
            return Err(Error::InvalidSetting(format!(
                "smoothing must be in [0, 1), got {}",
                self.audio.smoothing
            )));
        }
        if !(0.0..=1.0).contains(&self.display.fade_alpha) || self.display.fade_alpha == 0.0 {
            return Err(Error::InvalidSetting(format!(
                "fade_alpha must be in (0, 1], got {}",
                self.display.fade_alpha
            )));
        }
        if self.display.fps == 0 {
            return Err(Error::InvalidSetting("fps must be positive".into()));
        }
        if self.display.cell_width == 0 || self.display.cell_height == 0 {
            return Err(Error::InvalidSetting("cell size must be positive".into()));
        }
        Ok(())
    }

    /// Catalog to use: `explicit` file, then the configured file, then the
    /// inline tracks, then the built-in list.
    pub fn resolve_catalog(&self, explicit: Option<&Path>) -> Result<Vec<Track>> {
        if let Some(path) = explicit.or(self.catalog.as_deref()) {
            return load_catalog(path);
        }
        if !self.tracks.is_empty() {
            return Ok(self.tracks.clone());
        }
        Ok(builtin_catalog())
    }
}

/// Parse a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

fn parse_config(content: &str, path: &Path) -> Result<Config> {
    toml::from_str(content).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })
}
