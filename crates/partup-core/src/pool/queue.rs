//! Depth-1 hand-off between the producer and the upload workers.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::request::PartUploadRequest;

/// Capacity of the part queue. The producer can stage at most one request
/// while every worker is busy.
pub const QUEUE_CAPACITY: usize = 1;

/// Item passed from the producer to a worker.
#[derive(Debug)]
pub enum QueueItem {
    Part(PartUploadRequest),
    /// Stops the worker that receives it.
    Shutdown,
}

/// Producer side of the part queue.
#[derive(Clone)]
pub struct PartSender {
    tx: mpsc::Sender<QueueItem>,
}

/// Consumer side, shared by all workers of one pool.
#[derive(Clone)]
pub struct PartReceiver {
    rx: Arc<Mutex<mpsc::Receiver<QueueItem>>>,
}

/// Returned when every worker has gone away and the item cannot be queued.
#[derive(Debug, thiserror::Error)]
#[error("part queue closed")]
pub struct QueueClosed(pub QueueItem);

/// Create a bounded part queue with [`QUEUE_CAPACITY`] slots.
pub fn part_queue() -> (PartSender, PartReceiver) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (
        PartSender { tx },
        PartReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl PartSender {
    /// Queue `item`, waiting until a slot is free.
    pub async fn enqueue(&self, item: QueueItem) -> Result<(), QueueClosed> {
        self.tx.send(item).await.map_err(|e| QueueClosed(e.0))
    }
}

impl PartReceiver {
    /// Next item, or `None` once all senders are gone and the queue is empty.
    /// Only one worker waits on the channel at a time; the others wait on the lock.
    pub async fn dequeue(&self) -> Option<QueueItem> {
        self.rx.lock().await.recv().await
    }
}
