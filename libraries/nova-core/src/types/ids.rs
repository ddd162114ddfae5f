/// ID types for Nova Player tracks
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the source-kind prefix and the source key
const PREFIX_SEPARATOR: char = ':';

/// Where a track's audio comes from, derived from its id prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// YouTube Music video (`yt:<video_id>`)
    YouTube,

    /// File on the local device (`local:<path>`)
    Local,

    /// Any other prefix; carries the raw prefix (empty when the id has none)
    Other(String),
}

impl SourceKind {
    /// Whether this kind exposes a secondary streaming endpoint
    ///
    /// Only streamed sources have one; local files either open or they don't.
    pub fn supports_fallback(&self) -> bool {
        matches!(self, SourceKind::YouTube)
    }

    /// The id prefix for this kind
    pub fn prefix(&self) -> &str {
        match self {
            SourceKind::YouTube => "yt",
            SourceKind::Local => "local",
            SourceKind::Other(prefix) => prefix,
        }
    }
}

/// Track identifier
///
/// Globally unique and tagged with its source kind, e.g. `yt:dQw4w9WgXcQ`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an id from a kind and its source key
    pub fn from_parts(kind: &SourceKind, key: &str) -> Self {
        Self(format!("{}{}{}", kind.prefix(), PREFIX_SEPARATOR, key))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Source kind encoded in the prefix
    pub fn source_kind(&self) -> SourceKind {
        match self.0.split_once(PREFIX_SEPARATOR) {
            Some(("yt", _)) => SourceKind::YouTube,
            Some(("local", _)) => SourceKind::Local,
            Some((prefix, _)) => SourceKind::Other(prefix.to_string()),
            None => SourceKind::Other(String::new()),
        }
    }

    /// The source-specific key after the prefix (the whole id if unprefixed)
    pub fn key(&self) -> &str {
        self.0
            .split_once(PREFIX_SEPARATOR)
            .map_or(self.0.as_str(), |(_, key)| key)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
