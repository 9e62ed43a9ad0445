//! Worker pool draining the album queue.
//!
//! Keeps `workers` tokio tasks running; each takes albums from the shared
//! [`TaskReceiver`] until the queue is closed and drained. Per album:
//! run the handler, then on success advance the tag cursor (and drop the id
//! from the failure journal if it was a retry), on error record the album in
//! the journal and keep going.
//!
//! A panic while handling an album is not contained: the worker trips the
//! pool's [`CrashSignal`], logs it and flushes the journal. Every other worker
//! stops before taking another album, and [`WorkerPool::join`] returns
//! [`DispatchError`]. Producers should race [`CrashSignal::crashed`] so they
//! stop queueing; the caller is expected to terminate the process.

mod worker;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::handlers::AlbumHandler;
use crate::journal::FailureJournal;
use crate::progress::ProgressRegistry;
use crate::queue::TaskReceiver;

use worker::{flush_journal, run_worker, WorkerContext};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("worker {worker} crashed on album {id}: {message}")]
    WorkerPanicked {
        worker: usize,
        id: String,
        message: String,
    },

    #[error("worker task failed: {0}")]
    Join(String),
}

/// Counters from one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub succeeded: u64,
    pub failed: u64,
    /// Retries that succeeded (and were removed from the journal).
    pub retried_ok: u64,
}

/// Counters summed over the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    pub succeeded: u64,
    pub failed: u64,
    pub retried_ok: u64,
}

impl PoolReport {
    fn absorb(&mut self, w: WorkerReport) {
        self.succeeded += w.succeeded;
        self.failed += w.failed;
        self.retried_ok += w.retried_ok;
    }

    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Fleet-wide crash flag, tripped by the first worker that panics.
#[derive(Debug, Clone)]
pub struct CrashSignal(watch::Receiver<bool>);

impl CrashSignal {
    pub fn is_crashed(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once a worker has crashed; pending forever otherwise.
    pub async fn crashed(&mut self) {
        // Err means every worker is gone without a crash.
        let closed = self.0.wait_for(|crashed| *crashed).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Running pool handle. Close the queue (drop every sender), then `join`.
pub struct WorkerPool {
    join_set: JoinSet<Result<WorkerReport, DispatchError>>,
    journal: Arc<FailureJournal>,
    crash: CrashSignal,
    workers: usize,
}

impl WorkerPool {
    /// Spawn `workers` workers (at least one) on the current tokio runtime.
    pub fn spawn(
        workers: usize,
        receiver: TaskReceiver,
        handler: Arc<dyn AlbumHandler>,
        journal: Arc<FailureJournal>,
        progress: Arc<ProgressRegistry>,
    ) -> Self {
        let workers = workers.max(1);
        let (crash_tx, crash_rx) = watch::channel(false);
        let crash = CrashSignal(crash_rx);
        let ctx = Arc::new(WorkerContext {
            handler,
            journal: Arc::clone(&journal),
            progress,
            crash: crash_tx,
        });

        let mut join_set = JoinSet::new();
        for worker_id in 1..=workers {
            let rx = receiver.clone();
            let ctx = Arc::clone(&ctx);
            join_set.spawn(run_worker(worker_id, rx, crash.clone(), ctx));
        }
        tracing::info!(workers, handler = ctx.handler.name(), "workers ready");

        Self {
            join_set,
            journal,
            crash,
            workers,
        }
    }

    /// Handle for producers that must stop as soon as a worker crashes.
    pub fn crash_signal(&self) -> CrashSignal {
        self.crash.clone()
    }

    /// Wait for every worker to finish.
    ///
    /// On the first worker failure the remaining workers are aborted, the
    /// journal is flushed (best effort) and the error is returned.
    pub async fn join(mut self) -> Result<PoolReport, DispatchError> {
        let mut report = PoolReport {
            workers: self.workers,
            ..PoolReport::default()
        };

        while let Some(res) = self.join_set.join_next().await {
            let outcome = match res {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("worker task ended abnormally: {}", e);
                    Err(DispatchError::Join(e.to_string()))
                }
            };
            match outcome {
                Ok(w) => report.absorb(w),
                Err(err) => {
                    self.join_set.abort_all();
                    flush_journal(&self.journal).await;
                    return Err(err);
                }
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            retried_ok = report.retried_ok,
            "all workers finished"
        );
        Ok(report)
    }
}
