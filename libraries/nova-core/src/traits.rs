/// Collaborator traits for Nova Player
use async_trait::async_trait;

use crate::error::Result;
use crate::types::Track;

/// Recently-played history store
///
/// Implemented by the track-metadata repository. The playback controller calls
/// it exactly once per committed track transition, fire-and-forget: failures are
/// logged by the caller and never reach the user.
#[async_trait]
pub trait RecentlyPlayed: Send + Sync {
    /// Record that `track` started playing
    ///
    /// # Errors
    /// Returns an error if the underlying store rejects the write
    async fn add_to_recently_played(&self, track: &Track) -> Result<()>;
}
