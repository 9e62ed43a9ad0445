//! Background task that flushes the journal on an interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::FailureJournal;

/// Flushes `journal` every `every` while it has unsaved changes, until
/// `shutdown` turns true (or its sender is dropped); then flushes one last time.
/// Flush errors are logged, not returned.
pub fn spawn_periodic_flush(
    journal: Arc<FailureJournal>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_millis(10)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately.
        ticker.tick().await;

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if journal.is_dirty() {
                        flush_blocking(&journal).await;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        flush_blocking(&journal).await;
    })
}

async fn flush_blocking(journal: &Arc<FailureJournal>) {
    let journal = Arc::clone(journal);
    match tokio::task::spawn_blocking(move || journal.flush()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("periodic journal flush failed: {}", e),
        Err(e) => tracing::warn!("periodic journal flush task: {}", e),
    }
}
