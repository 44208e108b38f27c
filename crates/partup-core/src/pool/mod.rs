//! Upload worker pool.
//!
//! A fixed number of tokio tasks race for items on the depth-1 part queue and
//! send each part through the shared session. Part failures are logged and
//! counted; they never stop sibling workers. The pool is stopped by sending
//! one shutdown item per worker and joining every task.

mod queue;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::session::UploadSession;

pub use queue::{part_queue, PartReceiver, PartSender, QueueClosed, QueueItem, QUEUE_CAPACITY};

/// Delivery counts for one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Running workers plus the producer side of their queue.
pub struct UploadWorkerPool {
    sender: PartSender,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl UploadWorkerPool {
    /// Spawn `worker_count` workers (at least one) that invoke `session` for each part.
    pub fn start(session: Arc<dyn UploadSession>, worker_count: usize) -> Self {
        let (sender, receiver) = part_queue();
        let counters = Arc::new(Counters::default());
        let worker_count = worker_count.max(1);
        let workers = (0..worker_count)
            .map(|worker| {
                let rx = receiver.clone();
                let session = Arc::clone(&session);
                let counters = Arc::clone(&counters);
                tokio::spawn(run_worker(worker, session, rx, counters))
            })
            .collect();
        tracing::debug!(workers = worker_count, "upload workers started");
        Self {
            sender,
            workers,
            counters,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue one item, waiting for a free slot.
    pub async fn enqueue(&self, item: QueueItem) -> Result<(), QueueClosed> {
        self.sender.enqueue(item).await
    }

    /// Send one shutdown item per worker, then wait for every worker to exit.
    pub async fn shutdown(self) -> PoolSummary {
        for _ in 0..self.workers.len() {
            if self.sender.enqueue(QueueItem::Shutdown).await.is_err() {
                // Every worker already exited; nothing left to stop.
                break;
            }
        }
        for (worker, handle) in self.workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!(worker, error = %e, "upload worker panicked");
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        let summary = PoolSummary {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        };
        tracing::debug!(delivered = summary.delivered, failed = summary.failed, "upload workers stopped");
        summary
    }
}

async fn run_worker(
    worker: usize,
    session: Arc<dyn UploadSession>,
    rx: PartReceiver,
    counters: Arc<Counters>,
) {
    loop {
        let request = match rx.dequeue().await {
            Some(QueueItem::Part(request)) => request,
            Some(QueueItem::Shutdown) | None => return,
        };
        let file_id = request.file_id();
        let part = request.part_index();
        match session.invoke(request).await {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(worker, file_id, part, "part delivered");
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(worker, file_id, part, error = %e, "part upload failed");
            }
        }
    }
}
