//! CLI command handlers. Each command is in its own file.

mod failed;
mod input;
mod progress;
mod run;

pub use failed::run_failed;
pub use progress::run_progress;
pub use run::{run_albums, RunOptions};

use anyhow::Result;
use picflow_core::config::PicflowConfig;
use picflow_core::journal::FailureJournal;
use std::path::PathBuf;

/// Journal path from config, or the XDG default.
pub(crate) fn journal_path(cfg: &PicflowConfig) -> Result<PathBuf> {
    match &cfg.journal_path {
        Some(p) => Ok(p.clone()),
        None => FailureJournal::default_path(),
    }
}
