//! Property-based tests for the queue store
//!
//! Uses proptest to verify the queue-editing invariants across many random
//! edit sequences.

use nova_core::{Track, TrackId};
use nova_playback::QueueStore;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

// ===== Helpers =====

fn create_test_track(n: usize) -> Arc<Track> {
    Arc::new(Track::new(
        TrackId::new(format!("yt:{}", n)),
        format!("Title {}", n),
        "Artist",
        "Album",
        format!("https://media.invalid/{}", n),
    ))
}

fn queue_of(len: usize, current: usize) -> QueueStore {
    let mut queue = QueueStore::new();
    let tracks: Vec<_> = (0..len).map(create_test_track).collect();
    let start = tracks[current % len].id.clone();
    queue.set_queue(tracks, Some(&start));
    queue
}

fn ids(queue: &QueueStore) -> Vec<TrackId> {
    queue.tracks().iter().map(|t| t.id.clone()).collect()
}

fn assert_cursor_valid(queue: &QueueStore) -> Result<(), TestCaseError> {
    match queue.current_index() {
        Some(index) => prop_assert!(index < queue.len()),
        None => prop_assert!(queue.is_empty()),
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum Edit {
    MoveUp(usize),
    MoveDown(usize),
    Remove(usize),
    /// Reverse-rotate the queue by this many places
    Rotate(usize),
}

fn arbitrary_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..64).prop_map(Edit::MoveUp),
        (0usize..64).prop_map(Edit::MoveDown),
        (0usize..64).prop_map(Edit::Remove),
        (0usize..64).prop_map(Edit::Rotate),
    ]
}

// ===== Property Tests =====

proptest! {
    /// Property: edits never change which track is current
    #[test]
    fn edits_preserve_current_track(
        len in 1usize..40,
        current in 0usize..40,
        edits in prop::collection::vec(arbitrary_edit(), 1..30)
    ) {
        let mut queue = queue_of(len, current);
        let before = queue.current_track().map(|t| t.id.clone());

        for edit in edits {
            let pick =
                |n: usize, queue: &QueueStore| queue.get(n % queue.len()).map(|t| t.id.clone());
            match edit {
                Edit::MoveUp(n) => {
                    if let Some(id) = pick(n, &queue) {
                        queue.move_up(&id);
                    }
                }
                Edit::MoveDown(n) => {
                    if let Some(id) = pick(n, &queue) {
                        queue.move_down(&id);
                    }
                }
                Edit::Remove(n) => {
                    if let Some(id) = pick(n, &queue) {
                        let was_current = Some(&id) == before.as_ref();
                        let removed = queue.remove(&id);
                        prop_assert_eq!(removed, !was_current);
                    }
                }
                Edit::Rotate(n) => {
                    let mut order = queue.tracks().to_vec();
                    let by = n % order.len();
                    order.rotate_left(by);
                    queue.reorder(order);
                }
            }
            assert_cursor_valid(&queue)?;
        }

        let after = queue.current_track().map(|t| t.id.clone());
        prop_assert_eq!(before, after);
    }

    /// Property: dropping the current track clamps the cursor into bounds
    #[test]
    fn reorder_without_current_clamps(
        len in 2usize..40,
        current in 0usize..40,
        keep in prop::collection::vec(any::<bool>(), 40)
    ) {
        let mut queue = queue_of(len, current);
        let old_index = queue.current_index().unwrap();
        let current_id = queue.current_track().unwrap().id.clone();

        let survivors: Vec<_> = queue
            .tracks()
            .iter()
            .enumerate()
            .filter(|(i, t)| t.id != current_id && keep[*i])
            .map(|(_, t)| Arc::clone(t))
            .collect();
        let survivor_count = survivors.len();
        queue.reorder(survivors);

        if survivor_count == 0 {
            prop_assert_eq!(queue.current_index(), None);
        } else {
            prop_assert_eq!(queue.current_index(), Some(old_index.min(survivor_count - 1)));
        }
    }

    /// Property: shuffle on then off restores the exact order
    #[test]
    fn shuffle_round_trip(len in 1usize..60, current in 0usize..60) {
        let mut queue = queue_of(len, current);
        let original = ids(&queue);
        let current_id = queue.current_track().unwrap().id.clone();

        queue.set_shuffle(true);
        prop_assert_eq!(queue.current_index(), Some(0));
        prop_assert_eq!(&queue.current_track().unwrap().id, &current_id);

        let shuffled: HashSet<_> = ids(&queue).into_iter().collect();
        let expected: HashSet<_> = original.iter().cloned().collect();
        prop_assert_eq!(shuffled, expected);

        queue.set_shuffle(false);
        prop_assert_eq!(ids(&queue), original);
        prop_assert_eq!(&queue.current_track().unwrap().id, &current_id);
    }

    /// Property: next/previous never leave the queue
    #[test]
    fn navigation_stays_in_bounds(len in 1usize..30, current in 0usize..30, wrap in any::<bool>()) {
        let queue = queue_of(len, current);
        let index = queue.current_index().unwrap();

        match queue.next_index(wrap) {
            Some(next) => {
                prop_assert!(next < len);
                prop_assert!(next == index + 1 || (wrap && next == 0 && index == len - 1));
            }
            None => prop_assert!(!wrap && index == len - 1),
        }
        match queue.previous_index() {
            Some(previous) => prop_assert_eq!(previous + 1, index),
            None => prop_assert_eq!(index, 0),
        }
    }
}
