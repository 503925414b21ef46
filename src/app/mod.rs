// src/app/mod.rs
//! Application module - contains application state and logic.

pub mod state;

// Re-export the App struct
pub use state::{App, Chain};
