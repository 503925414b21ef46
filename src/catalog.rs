//! Static track catalog, loaded once at startup and read-only afterwards.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Static mood tags attached to a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TrackMood {
    pub energetic: f32,
    pub calm: f32,
    pub dark: f32,
    pub euphoric: f32,
}

/// One playable catalog entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Local path or http(s) URL.
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Length in seconds.
    pub duration: u64,
    #[serde(default)]
    pub mood: Option<TrackMood>,
}

/// Where the audio bytes for a track come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    File(PathBuf),
    Remote(String),
}

impl Track {
    pub fn source(&self) -> TrackSource {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            TrackSource::Remote(self.url.clone())
        } else {
            TrackSource::File(PathBuf::from(&self.url))
        }
    }

    /// `mm:ss` duration label.
    pub fn duration_label(&self) -> String {
        format!("{:02}:{:02}", self.duration / 60, self.duration % 60)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Load `[[tracks]]` entries from a standalone TOML file.
pub fn load_catalog(path: &Path) -> Result<Vec<Track>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CatalogFile = toml::from_str(&content).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.tracks)
}

fn entry(
    id: &str,
    title: &str,
    artist: &str,
    url: &str,
    duration: u64,
    mood: [f32; 4],
) -> Track {
    Track {
        id: id.into(),
        title: title.into(),
        artist: artist.into(),
        url: url.into(),
        thumbnail_url: Some(format!("https://example.com/{id}.jpg")),
        duration,
        mood: Some(TrackMood {
            energetic: mood[0],
            calm: mood[1],
            dark: mood[2],
            euphoric: mood[3],
        }),
    }
}

/// Catalog used when neither the config nor the command line supplies one.
pub fn builtin_catalog() -> Vec<Track> {
    vec![
        entry(
            "track1",
            "Electric Dreams",
            "Neural Pulse",
            "https://samplelib.com/lib/preview/mp3/sample-15s.mp3",
            185,
            [0.7, 0.2, 0.3, 0.8],
        ),
        entry(
            "track2",
            "Ambient Flow",
            "Synth Collective",
            "https://samplelib.com/lib/preview/mp3/sample-12s.mp3",
            243,
            [0.3, 0.8, 0.2, 0.6],
        ),
        entry(
            "track3",
            "Deep Bass Journey",
            "Frequency",
            "https://samplelib.com/lib/preview/mp3/sample-9s.mp3",
            197,
            [0.8, 0.1, 0.7, 0.5],
        ),
        entry(
            "track4",
            "Neon Lights",
            "Digital Wave",
            "https://samplelib.com/lib/preview/mp3/sample-6s.mp3",
            215,
            [0.6, 0.3, 0.4, 0.7],
        ),
        entry(
            "track5",
            "Quantum Field",
            "Binary Sunset",
            "https://samplelib.com/lib/preview/mp3/sample-3s.mp3",
            227,
            [0.4, 0.6, 0.5, 0.4],
        ),
    ]
}
