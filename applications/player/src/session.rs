//! Console collaborators: session surface, artwork and history
//!
//! Stand-ins for the platform media session and the metadata repository.
//! The surface logs what a lock screen would show; history lives in memory.

use async_trait::async_trait;
use nova_core::{RecentlyPlayed, SourceKind, Track, TrackId};
use nova_playback::{ArtworkProvider, SessionSummary, SessionSurface};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Session surface that logs every update
#[derive(Debug, Default)]
pub struct LoggingSurface;

#[async_trait]
impl SessionSurface for LoggingSurface {
    async fn publish(&self, summary: &SessionSummary) {
        tracing::info!(
            track = %summary.track_id,
            playing = summary.is_playing,
            artwork = summary.artwork.as_deref().unwrap_or("-"),
            "Session: {} - {}",
            summary.artist,
            summary.title
        );
    }

    async fn clear(&self) {
        tracing::info!("Session cleared");
    }
}

/// Thumbnail artwork for YouTube tracks
#[derive(Debug, Default)]
pub struct ThumbnailArtwork;

#[async_trait]
impl ArtworkProvider for ThumbnailArtwork {
    async fn artwork_for(&self, track: &Track) -> Option<String> {
        match track.id.source_kind() {
            SourceKind::YouTube => Some(format!(
                "https://i.ytimg.com/vi/{}/hqdefault.jpg",
                track.id.key()
            )),
            _ => None,
        }
    }
}

/// Bounded in-memory recently-played list, newest first
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<VecDeque<TrackId>>,
    capacity: usize,
}

impl MemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn recent(&self) -> Vec<TrackId> {
        self.entries.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl RecentlyPlayed for MemoryHistory {
    async fn add_to_recently_played(&self, track: &Track) -> nova_core::Result<()> {
        let mut entries = self.entries.lock().await;
        entries.retain(|id| id != &track.id);
        entries.push_front(track.id.clone());
        entries.truncate(self.capacity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::new(TrackId::new(id), id, "Artist", "Album", id)
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_deduplicated() {
        let history = MemoryHistory::new(2);
        history.add_to_recently_played(&track("yt:a")).await.unwrap();
        history.add_to_recently_played(&track("yt:b")).await.unwrap();
        history.add_to_recently_played(&track("yt:a")).await.unwrap();
        history.add_to_recently_played(&track("yt:c")).await.unwrap();

        let recent = history.recent().await;
        assert_eq!(recent, vec![TrackId::new("yt:c"), TrackId::new("yt:a")]);
    }

    #[tokio::test]
    async fn test_thumbnail_only_for_youtube() {
        let artwork = ThumbnailArtwork;
        assert_eq!(
            artwork.artwork_for(&track("yt:abc")).await.as_deref(),
            Some("https://i.ytimg.com/vi/abc/hqdefault.jpg")
        );
        assert_eq!(artwork.artwork_for(&track("local:/a.mp3")).await, None);
    }
}
