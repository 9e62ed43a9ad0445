//! One worker: dequeue, handle, commit outcome.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::watch;

use crate::handlers::AlbumHandler;
use crate::journal::FailureJournal;
use crate::progress::ProgressRegistry;
use crate::queue::TaskReceiver;

use super::{CrashSignal, DispatchError, WorkerReport};

/// State shared by every worker of a pool.
pub(super) struct WorkerContext {
    pub(super) handler: Arc<dyn AlbumHandler>,
    pub(super) journal: Arc<FailureJournal>,
    pub(super) progress: Arc<ProgressRegistry>,
    pub(super) crash: watch::Sender<bool>,
}

pub(super) async fn run_worker(
    worker: usize,
    rx: TaskReceiver,
    mut crash: CrashSignal,
    ctx: Arc<WorkerContext>,
) -> Result<WorkerReport, DispatchError> {
    let mut report = WorkerReport::default();

    loop {
        let album = tokio::select! {
            biased;
            _ = crash.crashed() => {
                tracing::warn!(worker, "another worker crashed, stopping");
                return Ok(report);
            }
            next = rx.recv() => match next {
                Some(album) => album,
                None => break,
            },
        };

        // Kept for the crash path; the live album moves into the handler task.
        let snapshot = album.minimized();

        let handler = Arc::clone(&ctx.handler);
        let attempt = tokio::spawn(async move {
            let res = handler.handle(&album).await;
            (album, res)
        })
        .await;

        match attempt {
            Ok((album, Ok(()))) => {
                if ctx.progress.advance(&album.tag, &album.id) {
                    tracing::debug!(worker, tag = %album.tag, id = %album.id, "progress cursor advanced");
                }
                if album.is_retry && ctx.journal.remove(&album.id) {
                    report.retried_ok += 1;
                }
                report.succeeded += 1;
                tracing::info!(worker, tag = %album.tag, id = %album.id, "album done");
            }
            Ok((album, Err(e))) => {
                tracing::warn!(worker, tag = %album.tag, id = %album.id, "album failed: {}", e);
                ctx.journal.record(&album);
                report.failed += 1;
            }
            Err(e) => {
                ctx.crash.send_replace(true);
                let message = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                tracing::error!(
                    worker,
                    tag = %snapshot.tag,
                    id = %snapshot.id,
                    "worker crashed, saving failure journal before exit: {}",
                    message
                );
                ctx.journal.record(&snapshot);
                flush_journal(&ctx.journal).await;
                return Err(DispatchError::WorkerPanicked {
                    worker,
                    id: snapshot.id,
                    message,
                });
            }
        }
    }

    tracing::info!(worker, "queue closed, worker finished");
    Ok(report)
}

/// Best-effort journal flush for the crash path; errors are logged.
pub(super) async fn flush_journal(journal: &Arc<FailureJournal>) {
    let journal = Arc::clone(journal);
    match tokio::task::spawn_blocking(move || journal.flush()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("failure journal flush failed: {}", e),
        Err(e) => tracing::error!("failure journal flush task: {}", e),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
