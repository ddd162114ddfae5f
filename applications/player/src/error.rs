/// Player application errors
use nova_playback::PlaybackError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument for '{command}': {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl PlayerError {
    pub fn invalid_argument(command: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            command,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
