//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Playback failures themselves never surface here: queue edits report
/// `false`, engine failures become `last_error` on the published snapshot.
/// What remains are the ways a caller can fail to reach the controller.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The controller task has shut down
    #[error("Playback controller is closed")]
    ControllerClosed,
}

/// Errors raised by a media engine adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Locator could not be opened or decoded
    #[error("Failed to prepare {locator}: {reason}")]
    Prepare { locator: String, reason: String },

    /// Transport call issued with nothing prepared
    #[error("No media prepared")]
    NotPrepared,

    /// Seek rejected by the engine
    #[error("Seek failed: {0}")]
    Seek(String),

    /// Output device or decoder failure mid-playback
    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;
