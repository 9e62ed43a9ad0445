//! `picflow run` / `picflow retry` – feed albums to the worker pool.

use anyhow::{Context, Result};
use picflow_core::album::Album;
use picflow_core::config;
use picflow_core::dispatcher::{PoolReport, WorkerPool};
use picflow_core::handlers::build_handler;
use picflow_core::journal::{spawn_periodic_flush, FailureJournal};
use picflow_core::progress::ProgressRegistry;
use picflow_core::queue::{task_queue, TaskSender};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::LoadedConfig;

use super::input::load_albums;
use super::journal_path;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// NDJSON album file; `None` for retry-only runs.
    pub input: Option<PathBuf>,
    /// Re-submit failure journal entries before fresh albums.
    pub include_retries: bool,
    /// Overrides `workers` from config.
    pub workers: Option<usize>,
}

/// Counts from the producer side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Produced {
    pub queued: usize,
    pub skipped: usize,
    pub retries: usize,
}

pub async fn run_albums(loaded: LoadedConfig, opts: RunOptions) -> Result<PoolReport> {
    let LoadedConfig { mut cfg, path: cfg_path } = loaded;
    if let Some(n) = opts.workers {
        cfg.workers = n;
    }

    // Startup checks: any failure here is fatal before a worker runs.
    let handler = build_handler(&cfg)?;
    let journal_file = journal_path(&cfg)?;
    let journal = Arc::new(FailureJournal::open(&journal_file)?);
    let fresh = match &opts.input {
        Some(path) => load_albums(path).await?,
        None => Vec::new(),
    };
    let retries = if opts.include_retries {
        journal.retry_albums()
    } else {
        Vec::new()
    };

    let progress = Arc::new(ProgressRegistry::from_cursors(cfg.cursors()));
    let (tx, rx) = task_queue(cfg.queue_capacity());
    let pool = WorkerPool::spawn(
        cfg.workers,
        rx,
        handler,
        Arc::clone(&journal),
        Arc::clone(&progress),
    );

    let (flush_stop, flush_rx) = tokio::sync::watch::channel(false);
    let flusher = spawn_periodic_flush(
        Arc::clone(&journal),
        Duration::from_secs(cfg.journal_flush_secs.max(1)),
        flush_rx,
    );

    let mut crash = pool.crash_signal();
    let produced = tokio::select! {
        produced = produce(&tx, &progress, retries, fresh) => produced,
        _ = crash.crashed() => {
            tracing::error!("a worker crashed: no more albums will be queued");
            Produced::default()
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted: no more albums will be queued, waiting for workers");
            Produced::default()
        }
    };
    tx.close();
    tracing::info!(
        queued = produced.queued,
        skipped = produced.skipped,
        retries = produced.retries,
        "producer finished"
    );

    let outcome = pool.join().await;

    let _ = flush_stop.send(true);
    if let Err(e) = flusher.await {
        tracing::warn!("journal flusher task: {}", e);
    }

    // Cursors are saved on the crash path too; they only ever hold completed ids.
    cfg.apply_progress(&progress.snapshot());
    if let Err(e) = config::save_to_path(&cfg, &cfg_path) {
        tracing::warn!("could not save progress to {}: {:#}", cfg_path.display(), e);
    }

    let report = outcome.context("worker pool crashed")?;
    println!(
        "{} album(s) done, {} failed, {} retried ok; {} in failure journal",
        report.succeeded,
        report.failed,
        report.retried_ok,
        journal.len()
    );
    Ok(report)
}

/// Queue retries first, then fresh albums not already behind their tag's cursor.
async fn produce(
    tx: &TaskSender,
    progress: &ProgressRegistry,
    retries: Vec<Album>,
    fresh: Vec<Album>,
) -> Produced {
    let mut produced = Produced::default();
    for album in retries {
        if tx.enqueue(album).await.is_err() {
            tracing::warn!("worker pool stopped, remaining albums not queued");
            return produced;
        }
        produced.retries += 1;
        produced.queued += 1;
    }
    for album in fresh {
        if progress.is_done(&album.tag, &album.id) {
            tracing::debug!(tag = %album.tag, id = %album.id, "already done, skipping");
            produced.skipped += 1;
            continue;
        }
        if tx.enqueue(album).await.is_err() {
            tracing::warn!("worker pool stopped, remaining albums not queued");
            return produced;
        }
        produced.queued += 1;
    }
    produced
}
