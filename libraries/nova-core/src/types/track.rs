//! Track types
use serde::{Deserialize, Serialize};

use super::TrackId;

/// One unit of playable media
///
/// Immutable once built. The playback controller only ever changes which
/// tracks are in the queue and in what order, never a track itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique, source-kind-prefixed identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Opaque locator handed to the media engine (usually a stream URL)
    pub source_locator: String,
}

impl Track {
    /// Create a new track
    pub fn new(
        id: TrackId,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        source_locator: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            source_locator: source_locator.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_uses_camel_case_on_the_wire() {
        let track = Track::new(TrackId::new("yt:a"), "Title", "Artist", "Album", "http://x");
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["sourceLocator"], "http://x");
        assert_eq!(json["id"], "yt:a");
    }
}
