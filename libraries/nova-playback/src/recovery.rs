//! Failure recovery policy
//!
//! Decides what the controller does when the engine fails to attach a track:
//! try the track's fallback locator once, then give up on the track and move
//! to the next queue item, or end playback when there is none.

use nova_core::Track;

/// Attach history of the current track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachAttempt {
    /// Engine attach attempts made so far, including the failed one
    pub attempts: u8,

    /// Whether the failed attempt already used the fallback locator
    pub used_fallback: bool,
}

impl AttachAttempt {
    /// History of a track's first attach
    pub fn first() -> Self {
        Self {
            attempts: 1,
            used_fallback: false,
        }
    }

    /// History after retrying with the fallback locator
    pub fn retried_with_fallback(self) -> Self {
        Self {
            attempts: self.attempts.saturating_add(1),
            used_fallback: true,
        }
    }
}

/// Outcome of a failed attach
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryDecision {
    /// Re-attach the same track from `locator`
    RetryWithFallback {
        /// Alternate locator for the same track
        locator: String,
    },

    /// Give up on the track and attach the queue item at this index
    SkipTo(usize),

    /// Nothing left to try; playback ends with the error surfaced
    End,
}

/// Retry/fallback/skip policy
#[derive(Debug, Clone)]
pub struct FailureRecoveryPolicy {
    /// Hard cap on attach attempts per track
    max_attempts: u8,

    /// Base URL of the secondary audio endpoint
    fallback_endpoint: Option<String>,
}

impl FailureRecoveryPolicy {
    /// Creates a policy allowing `max_attempts` attaches per track
    pub fn new(max_attempts: u8) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            fallback_endpoint: None,
        }
    }

    /// Sets the secondary endpoint fallback locators are derived from
    pub fn with_fallback_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.fallback_endpoint = endpoint.map(|e| e.trim_end_matches('/').to_string());
        self
    }

    /// Alternate locator for `track`, if its source kind has one
    pub fn fallback_locator(&self, track: &Track) -> Option<String> {
        let endpoint = self.fallback_endpoint.as_deref()?;
        if !track.id.source_kind().supports_fallback() {
            return None;
        }
        Some(format!(
            "{}/audio_fallback?video_id={}",
            endpoint,
            track.id.key()
        ))
    }

    /// Decide how to recover from a failed attach of `track`
    ///
    /// `next_index` is the queue item after the failed one, without
    /// repeat-all wrap-around.
    pub fn decide(
        &self,
        attempt: &AttachAttempt,
        track: &Track,
        next_index: Option<usize>,
    ) -> RecoveryDecision {
        if attempt.attempts < self.max_attempts && !attempt.used_fallback {
            if let Some(locator) = self.fallback_locator(track) {
                return RecoveryDecision::RetryWithFallback { locator };
            }
        }

        match next_index {
            Some(index) => RecoveryDecision::SkipTo(index),
            None => RecoveryDecision::End,
        }
    }
}

impl Default for FailureRecoveryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_core::TrackId;

    fn track(id: &str) -> Track {
        Track::new(TrackId::new(id), "Title", "Artist", "Album", "https://primary")
    }

    fn policy() -> FailureRecoveryPolicy {
        FailureRecoveryPolicy::new(2).with_fallback_endpoint(Some("https://api.example/".into()))
    }

    #[test]
    fn first_failure_retries_with_fallback() {
        let decision = policy().decide(&AttachAttempt::first(), &track("yt:abc123"), Some(3));
        assert_eq!(
            decision,
            RecoveryDecision::RetryWithFallback {
                locator: "https://api.example/audio_fallback?video_id=abc123".into()
            }
        );
    }

    #[test]
    fn fallback_failure_skips_to_next() {
        let attempt = AttachAttempt::first().retried_with_fallback();
        assert_eq!(attempt.attempts, 2);
        let decision = policy().decide(&attempt, &track("yt:abc123"), Some(3));
        assert_eq!(decision, RecoveryDecision::SkipTo(3));
    }

    #[test]
    fn fallback_failure_at_end_of_queue_ends() {
        let attempt = AttachAttempt::first().retried_with_fallback();
        assert_eq!(
            policy().decide(&attempt, &track("yt:abc123"), None),
            RecoveryDecision::End
        );
    }

    #[test]
    fn kinds_without_fallback_skip_immediately() {
        let decision = policy().decide(
            &AttachAttempt::first(),
            &track("local:/music/a.flac"),
            Some(1),
        );
        assert_eq!(decision, RecoveryDecision::SkipTo(1));
    }

    #[test]
    fn no_endpoint_means_no_fallback() {
        let policy = FailureRecoveryPolicy::default();
        assert!(policy.fallback_locator(&track("yt:abc123")).is_none());
        assert_eq!(
            policy.decide(&AttachAttempt::first(), &track("yt:abc123"), None),
            RecoveryDecision::End
        );
    }

    #[test]
    fn single_attempt_cap_disables_fallback() {
        let policy =
            FailureRecoveryPolicy::new(1).with_fallback_endpoint(Some("https://api".into()));
        assert_eq!(
            policy.decide(&AttachAttempt::first(), &track("yt:abc123"), Some(2)),
            RecoveryDecision::SkipTo(2)
        );
    }
}
