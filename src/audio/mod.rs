//! Audio module - playback, microphone capture, and feature extraction.

pub mod analyser;
pub mod capture;
pub mod features;
pub mod fft;
pub mod microphone;
pub mod player;
pub mod source;

// Re-export commonly used types
pub use analyser::{Analyser, Tap};
pub use features::{FeatureExtractor, FeatureSnapshot};
pub use microphone::CpalMicrophone;
pub use player::MusicPlayer;
pub use source::{LoadId, Microphone, Playback, PlaybackEvent, SignalSource, SourceEvent};
