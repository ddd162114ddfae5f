//! Shuffle algorithm for queue randomization
//!
//! The track under the cursor stays put at the head of the queue; only the
//! tracks after it are permuted (Fisher-Yates).

use nova_core::Track;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Shuffle everything after `tracks[0]` using the thread-local RNG
pub fn shuffle_after_head(tracks: &mut [Arc<Track>]) {
    shuffle_after_head_with(tracks, &mut rand::thread_rng());
}

/// Shuffle everything after `tracks[0]` with a caller-supplied RNG
pub fn shuffle_after_head_with<R: Rng + ?Sized>(tracks: &mut [Arc<Track>], rng: &mut R) {
    if tracks.len() <= 2 {
        // Nothing (or a single track) to permute
        return;
    }
    tracks[1..].shuffle(rng);
}
