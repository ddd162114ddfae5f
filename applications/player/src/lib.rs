//! Nova Player console harness
//!
//! Drives the playback controller from line-based commands against a
//! simulated media engine. Exposed as a library for integration tests.

pub mod app;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;

// Re-export commonly used types for convenience
pub use app::{Outcome, Player};
pub use commands::PlayerCommand;
pub use config::{AppConfig, SimulationSettings};
pub use engine::SimulatedEngine;
pub use error::{PlayerError, Result};
