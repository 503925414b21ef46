//! Error types shared across the audio, config and catalog layers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    #[error("no audio input device available")]
    NoInputDevice,
    #[error("microphone unavailable: {0}")]
    Microphone(String),
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to decode {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
