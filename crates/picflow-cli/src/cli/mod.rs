//! CLI for the picflow album worker pool.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use picflow_core::config::{self, PicflowConfig};
use std::path::PathBuf;

use commands::{run_albums, run_failed, run_progress, RunOptions};

/// Top-level CLI for picflow.
#[derive(Debug, Parser)]
#[command(name = "picflow")]
#[command(about = "picflow: download or forward albums with a bounded worker pool", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/picflow/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Process albums from a newline-delimited JSON file.
    Run {
        /// File with one album object per line.
        input: PathBuf,
        /// Also re-submit every album in the failure journal.
        #[arg(long)]
        retry: bool,
        /// Override the configured number of workers.
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },

    /// Re-submit only the albums recorded in the failure journal.
    Retry {
        /// Override the configured number of workers.
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },

    /// List albums in the failure journal.
    Failed,

    /// Show the progress cursor of every tag.
    Progress,
}

/// Loaded config plus where it came from (cursors are written back there).
pub struct LoadedConfig {
    pub cfg: PicflowConfig,
    pub path: PathBuf,
}

fn load_config(explicit: Option<PathBuf>) -> Result<LoadedConfig> {
    match explicit {
        Some(path) => Ok(LoadedConfig {
            cfg: config::load_from_path(&path)?,
            path,
        }),
        None => Ok(LoadedConfig {
            cfg: config::load_or_init()?,
            path: config::config_path()?,
        }),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let loaded = load_config(cli.config)?;
        tracing::debug!("loaded config: {:?}", loaded.cfg);

        match cli.command {
            CliCommand::Run {
                input,
                retry,
                workers,
            } => {
                let opts = RunOptions {
                    input: Some(input),
                    include_retries: retry,
                    workers,
                };
                run_albums(loaded, opts).await?;
            }
            CliCommand::Retry { workers } => {
                let opts = RunOptions {
                    input: None,
                    include_retries: true,
                    workers,
                };
                run_albums(loaded, opts).await?;
            }
            CliCommand::Failed => run_failed(&loaded.cfg)?,
            CliCommand::Progress => run_progress(&loaded.cfg),
        }

        Ok(())
    }
}
