//! Bounded multi-producer, multi-consumer channel.
//!
//! Used for both the admission queue feeding the sender pool and the result
//! sink drained by callers. Producers wait while the channel is full; nothing
//! is dropped.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

pub use tokio::sync::mpsc::error::SendError;

/// Create a channel holding at most `capacity` items (minimum 1).
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        Sender { inner: tx },
        Receiver {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer handle.
#[derive(Debug)]
pub struct Sender<T> {
    inner: mpsc::Sender<T>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Sender<T> {
    /// Send an item, waiting for a free slot if the channel is full.
    pub async fn send(&self, item: T) -> Result<(), SendError<T>> {
        self.inner.send(item).await
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.inner.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.inner.max_capacity()
    }
}

/// Consumer handle. Clones share one underlying queue; each item is
/// delivered to exactly one of them.
#[derive(Debug)]
pub struct Receiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Receiver<T> {
    /// Wait for the next item. Returns `None` once every sender is gone and
    /// the queue is drained.
    pub async fn recv(&self) -> Option<T> {
        self.inner.lock().await.recv().await
    }

    /// Take an item if one is ready and no other consumer is waiting.
    pub fn try_recv(&self) -> Option<T> {
        self.inner.try_lock().ok()?.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_full_channel_blocks_producer() {
        let (tx, rx) = bounded::<u32>(1);
        tx.send(1).await.unwrap();
        assert_eq!(tx.available(), 0);

        // Second send must wait for a slot rather than drop.
        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.send(2)).await;
        assert!(blocked.is_err());

        let producer = {
            let tx = tx.clone();
            tokio::spawn(async move { tx.send(3).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(rx.recv().await, Some(1));
        producer.await.unwrap().unwrap();
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test]
    async fn test_consumers_share_items() {
        let (tx, rx) = bounded::<u32>(8);
        let other = rx.clone();
        for i in 0..4 {
            tx.send(i).await.unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Some(item) = rx.try_recv() {
            seen.push(item);
            if let Some(item) = other.recv().await {
                seen.push(item);
            }
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(other.recv().await, None);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let (tx, _rx) = bounded::<u32>(0);
        assert_eq!(tx.max_capacity(), 1);
    }
}
