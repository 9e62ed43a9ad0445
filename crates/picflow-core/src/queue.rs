//! Bounded album queue between producers and the worker pool.
//!
//! Backed by a tokio mpsc channel. Senders are cloned per producer; the
//! receiver is shared by all workers behind an async mutex. The queue is
//! closed when every sender is dropped; receivers then drain what is left
//! and get `None`.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::album::Album;

/// Returned by [`TaskSender::enqueue`] when no worker is left to receive.
/// Carries the album back to the producer.
#[derive(Debug, thiserror::Error)]
#[error("album queue closed (album {} not enqueued)", .0.id)]
pub struct QueueClosed(pub Album);

/// Producer side of the queue.
#[derive(Debug, Clone)]
pub struct TaskSender {
    tx: mpsc::Sender<Album>,
}

/// Consumer side of the queue; clone one per worker.
#[derive(Debug, Clone)]
pub struct TaskReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Album>>>,
}

/// Create a queue holding at most `capacity` albums (at least 1).
pub fn task_queue(capacity: usize) -> (TaskSender, TaskReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        TaskSender { tx },
        TaskReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl TaskSender {
    /// Enqueue an album, waiting while the queue is full.
    pub async fn enqueue(&self, album: Album) -> Result<(), QueueClosed> {
        self.tx.send(album).await.map_err(|e| QueueClosed(e.0))
    }

    /// Drop this producer handle. The queue closes once every clone is gone.
    pub fn close(self) {
        drop(self);
    }
}

impl TaskReceiver {
    /// Next album, or `None` once the queue is closed and drained.
    pub async fn recv(&self) -> Option<Album> {
        self.rx.lock().await.recv().await
    }
}
