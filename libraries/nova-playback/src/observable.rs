//! Last-value observables
//!
//! Thin wrapper over `tokio::sync::watch`: late subscribers see the current
//! value immediately, slow subscribers skip intermediate values instead of
//! queueing them.

use tokio::sync::watch;

/// Publishing side of an observable value
#[derive(Debug)]
pub struct Publisher<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + PartialEq> Publisher<T> {
    /// Create a publisher holding `initial`
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the value and notify subscribers
    pub fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Replace the value only if it differs from the current one
    ///
    /// Returns whether subscribers were notified.
    pub fn publish_if_changed(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Current value
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Read-only handle for consumers
    pub fn observable(&self) -> Observable<T> {
        Observable {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only view of a published value
#[derive(Debug, Clone)]
pub struct Observable<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Observable<T> {
    /// Current value, without waiting
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next value
    ///
    /// Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until `predicate` holds for the current value, then return it
    ///
    /// Returns `None` if the publisher goes away first.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        self.rx
            .wait_for(|value| predicate(value))
            .await
            .ok()
            .map(|value| value.clone())
    }

    /// Raw watch receiver, for `tokio::select!` loops
    pub fn receiver(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn late_subscriber_sees_current_value() {
        let publisher = Publisher::new(1u32);
        publisher.publish(2);

        let observable = publisher.observable();
        assert_eq!(observable.get(), 2);
    }

    #[tokio::test]
    async fn publish_if_changed_skips_equal_values() {
        let publisher = Publisher::new("a".to_string());
        let mut observable = publisher.observable();

        assert!(!publisher.publish_if_changed("a".to_string()));
        assert!(publisher.publish_if_changed("b".to_string()));
        assert_eq!(observable.changed().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn changed_ends_when_publisher_dropped() {
        let publisher = Publisher::new(0u8);
        let mut observable = publisher.observable();
        drop(publisher);

        assert_eq!(observable.changed().await, None);
    }
}
