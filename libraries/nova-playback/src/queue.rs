//! Queue store
//!
//! Ordered track list plus the current-index cursor. Pure data and editing
//! algorithms, no I/O.
//!
//! The cursor follows identity, not position: every edit that shifts tracks
//! around re-points `current` at the track that was current before the edit.
//!
//! ```text
//! tracks:  [ B ][ A ][ C ]      MoveDown("A") on [A, B, C], A current
//!                 ^
//!              current = 1
//! ```

use crate::shuffle::shuffle_after_head;
use nova_core::{Track, TrackId};
use std::sync::Arc;

/// Queue of tracks with a current-position cursor
#[derive(Debug, Clone, Default)]
pub struct QueueStore {
    /// Tracks in play order
    tracks: Vec<Arc<Track>>,

    /// Cursor into `tracks`; always a live index or `None`
    current: Option<usize>,

    /// Order before shuffle was enabled; `Some` exactly while shuffled
    pre_shuffle: Option<Vec<Arc<Track>>>,
}

impl QueueStore {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue wholesale
    ///
    /// Selects `start_id` if present, index 0 otherwise. An empty `tracks`
    /// leaves the queue untouched and returns `false`.
    pub fn set_queue(&mut self, tracks: Vec<Arc<Track>>, start_id: Option<&TrackId>) -> bool {
        if tracks.is_empty() {
            return false;
        }

        let start = start_id
            .and_then(|id| tracks.iter().position(|t| &t.id == id))
            .unwrap_or(0);

        self.tracks = tracks;
        self.current = Some(start);

        if self.pre_shuffle.is_some() {
            self.shuffle_around_current();
        }
        true
    }

    /// Swap `id` with its predecessor
    ///
    /// Returns `false` if `id` is absent or already first.
    pub fn move_up(&mut self, id: &TrackId) -> bool {
        match self.position_of(id) {
            Some(pos) if pos > 0 => {
                self.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap `id` with its successor
    ///
    /// Returns `false` if `id` is absent or already last.
    pub fn move_down(&mut self, id: &TrackId) -> bool {
        match self.position_of(id) {
            Some(pos) if pos + 1 < self.tracks.len() => {
                self.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Remove `id` from the queue
    ///
    /// Refuses (returns `false`) when `id` is absent or is the current track.
    pub fn remove(&mut self, id: &TrackId) -> bool {
        let Some(pos) = self.position_of(id) else {
            return false;
        };
        if Some(pos) == self.current {
            return false;
        }

        self.tracks.remove(pos);
        if let Some(current) = self.current {
            if current > pos {
                self.current = Some(current - 1);
            }
        }
        if self.tracks.is_empty() {
            self.current = None;
        }

        // Keep the pre-shuffle order consistent with membership
        if let Some(original) = self.pre_shuffle.as_mut() {
            if let Some(orig_pos) = original.iter().position(|t| &t.id == id) {
                original.remove(orig_pos);
            }
        }
        true
    }

    /// Replace the order (and possibly the membership) of the queue
    ///
    /// The cursor moves to wherever the previously-current track landed. If
    /// that track is gone, the old numeric index is kept, clamped into bounds.
    pub fn reorder(&mut self, new_order: Vec<Arc<Track>>) {
        let previous_id = self.current_track().map(|t| t.id.clone());
        let previous_index = self.current;

        self.tracks = new_order;
        self.current = if self.tracks.is_empty() {
            None
        } else {
            previous_id
                .and_then(|id| self.position_of(&id))
                .or_else(|| previous_index.map(|i| i.min(self.tracks.len() - 1)))
        };

        if let Some(original) = self.pre_shuffle.as_mut() {
            original.retain(|t| self.tracks.iter().any(|n| n.id == t.id));
            for track in &self.tracks {
                if !original.iter().any(|t| t.id == track.id) {
                    original.push(Arc::clone(track));
                }
            }
        }
    }

    /// Enable or disable shuffle
    ///
    /// Enabling pins the current track at position 0, randomizes the rest and
    /// remembers the previous order. Disabling restores that order exactly.
    /// Returns `false` if the flag already had the requested value.
    pub fn set_shuffle(&mut self, enabled: bool) -> bool {
        match (enabled, self.pre_shuffle.is_some()) {
            (true, false) => {
                self.shuffle_around_current();
                true
            }
            (false, true) => {
                self.restore_original_order();
                true
            }
            _ => false,
        }
    }

    /// Append tracks to the end; selects index 0 if nothing was selected
    pub fn append(&mut self, tracks: Vec<Arc<Track>>) {
        if let Some(original) = self.pre_shuffle.as_mut() {
            original.extend(tracks.iter().cloned());
        }
        self.tracks.extend(tracks);
        if self.current.is_none() && !self.tracks.is_empty() {
            self.current = Some(0);
        }
    }

    /// Insert a track right after the current one
    ///
    /// Returns the index it was inserted at.
    pub fn insert_next(&mut self, track: Arc<Track>) -> usize {
        let index = self.current.map_or(self.tracks.len(), |c| c + 1);

        if let Some(original) = self.pre_shuffle.as_mut() {
            let after_current = self
                .current
                .and_then(|c| self.tracks.get(c))
                .and_then(|cur| original.iter().position(|t| t.id == cur.id))
                .map_or(original.len(), |p| p + 1);
            original.insert(after_current, Arc::clone(&track));
        }

        self.tracks.insert(index, track);
        if self.current.is_none() {
            self.current = Some(index);
        }
        index
    }

    /// Move the cursor to `index`
    ///
    /// Returns the newly current track, or `None` if `index` is out of range.
    pub fn select(&mut self, index: usize) -> Option<Arc<Track>> {
        let track = self.tracks.get(index).cloned()?;
        self.current = Some(index);
        Some(track)
    }

    /// Index after the cursor
    ///
    /// At the last index, wraps to 0 when `wrap` is set, otherwise `None`.
    pub fn next_index(&self, wrap: bool) -> Option<usize> {
        let current = self.current?;
        if current + 1 < self.tracks.len() {
            Some(current + 1)
        } else if wrap {
            Some(0)
        } else {
            None
        }
    }

    /// Index before the cursor, `None` at the start
    pub fn previous_index(&self) -> Option<usize> {
        self.current.filter(|&c| c > 0).map(|c| c - 1)
    }

    /// Drop every track and the shuffle snapshot's contents
    ///
    /// The shuffle flag itself survives, so the next queue is shuffled too.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
        if let Some(original) = self.pre_shuffle.as_mut() {
            original.clear();
        }
    }

    /// Currently selected track
    pub fn current_track(&self) -> Option<&Arc<Track>> {
        self.current.and_then(|c| self.tracks.get(c))
    }

    /// Cursor position
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&Arc<Track>> {
        self.tracks.get(index)
    }

    /// Position of `id` in play order
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    /// All tracks in play order
    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Check if the queue is shuffled
    pub fn is_shuffled(&self) -> bool {
        self.pre_shuffle.is_some()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.tracks.swap(a, b);
        self.current = self.current.map(|c| match c {
            c if c == a => b,
            c if c == b => a,
            c => c,
        });
    }

    fn shuffle_around_current(&mut self) {
        self.pre_shuffle = Some(self.tracks.clone());
        if self.tracks.is_empty() {
            return;
        }

        let current = self.current.unwrap_or(0);
        self.tracks.swap(0, current);
        shuffle_after_head(&mut self.tracks);
        if self.current.is_some() {
            self.current = Some(0);
        }
    }

    fn restore_original_order(&mut self) {
        let Some(original) = self.pre_shuffle.take() else {
            return;
        };
        let current_id = self.current_track().map(|t| t.id.clone());
        let previous_index = self.current;

        self.tracks = original;
        self.current = if self.tracks.is_empty() {
            None
        } else {
            current_id
                .and_then(|id| self.position_of(&id))
                .or_else(|| previous_index.map(|i| i.min(self.tracks.len() - 1)))
        };
    }
}
