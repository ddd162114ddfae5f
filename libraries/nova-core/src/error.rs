/// Core error types for Nova Player
use thiserror::Error;

/// Result type alias using `NovaError`
pub type Result<T> = std::result::Result<T, NovaError>;

/// Core error type for Nova Player
#[derive(Error, Debug)]
pub enum NovaError {
    /// Repository (metadata / history store) errors
    #[error("Repository error: {0}")]
    Repository(String),
}

impl NovaError {
    /// Create a repository error
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
