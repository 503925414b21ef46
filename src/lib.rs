// src/lib.rs
//! Neurobeats - a terminal music visualizer.
//!
//! Audio from a catalog track or the microphone feeds a single analyser. Each
//! frame a feature snapshot is extracted from it and handed to the active
//! scene and to the mood panel.

pub mod app;
pub mod audio;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod insight;
pub mod scene;
pub mod scheduler;
pub mod ui;
