//! Fixed-size sender pool.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::channel::Receiver;

/// Processes one unit of work taken from the admission queue.
#[trait_variant::make(Send)]
pub trait Handler<T>: Send + Sync {
    async fn handle(&self, unit: T);
}

/// A fixed set of workers draining one shared queue.
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `size` workers (minimum 1). Each takes one unit at a time and
    /// runs it to completion before taking the next.
    pub fn spawn<T, H>(size: usize, units: Receiver<T>, handler: Arc<H>) -> Self
    where
        T: Send + 'static,
        H: Handler<T> + 'static,
    {
        let workers = (0..size.max(1))
            .map(|id| tokio::spawn(run_worker(id, units.clone(), Arc::clone(&handler))))
            .collect();

        Self { workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Wait for every worker to exit. Workers exit once the queue is closed
    /// and drained.
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "sender task failed");
            }
        }
    }
}

async fn run_worker<T, H>(id: usize, units: Receiver<T>, handler: Arc<H>)
where
    T: Send + 'static,
    H: Handler<T>,
{
    tracing::debug!(worker = id, "sender started");

    while let Some(unit) = units.recv().await {
        handler.handle(unit).await;
    }

    tracing::debug!(worker = id, "sender stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::channel;

    struct Slow {
        active: AtomicUsize,
        peak: AtomicUsize,
        done: AtomicUsize,
    }

    impl Handler<u32> for Slow {
        async fn handle(&self, _unit: u32) {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.done.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_bounds_concurrency() {
        let (tx, rx) = channel::bounded(64);
        let handler = Arc::new(Slow {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        });
        let pool = WorkerPool::spawn(3, rx, Arc::clone(&handler));
        assert_eq!(pool.size(), 3);

        for i in 0..20 {
            tx.send(i).await.unwrap();
        }
        drop(tx);
        pool.join().await;

        assert_eq!(handler.done.load(Ordering::SeqCst), 20);
        assert!(handler.peak.load(Ordering::SeqCst) <= 3);
    }
}
