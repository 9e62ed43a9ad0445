//! Album handlers: the side effect performed for each album.
//!
//! The worker pool only sees [`AlbumHandler`]. Which handler runs is chosen
//! once per process from the `handler` config value via [`HandlerKind`].

mod forward;
mod local;
pub mod naming;
mod transfer;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::album::Album;
use crate::config::{ConfigError, PicflowConfig};

pub use forward::Forwarder;
pub use local::LocalSaver;

/// Error from a single handler invocation. Contained by the worker and
/// recorded in the failure journal.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("transfer {url}: {source}")]
    Transfer { url: String, source: curl::Error },

    #[error("{url} returned HTTP {code}")]
    Http { url: String, code: u32 },

    #[error("io {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("encode album: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("album {0} has no urls")]
    NoUrls(String),

    #[error("{0}")]
    Other(String),
}

/// Performs the download/forward for one album.
#[async_trait]
pub trait AlbumHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, album: &Album) -> Result<(), HandlerError>;
}

/// Handler selected by the `handler` config value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Save pictures under `save_dir`.
    Local,
    /// POST the album as JSON to `forward_url`.
    Forward,
}

impl HandlerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerKind::Local => "local",
            HandlerKind::Forward => "forward",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(HandlerKind::Local),
            "forward" => Ok(HandlerKind::Forward),
            _ => Err(ConfigError::UnknownHandler(s.to_string())),
        }
    }
}

/// Build the process-wide handler from config. Fails on an unknown kind or
/// missing settings; callers treat that as fatal.
pub fn build_handler(cfg: &PicflowConfig) -> Result<Arc<dyn AlbumHandler>, ConfigError> {
    let kind: HandlerKind = cfg.handler.parse()?;
    let handler: Arc<dyn AlbumHandler> = match kind {
        HandlerKind::Local => Arc::new(LocalSaver::new(cfg.save_dir.clone())),
        HandlerKind::Forward => {
            let url = cfg
                .forward_url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .ok_or(ConfigError::MissingForwardUrl)?;
            Arc::new(Forwarder::new(url))
        }
    };
    tracing::debug!(%kind, handler = handler.name(), "album handler ready");
    Ok(handler)
}

/// Runs blocking libcurl work off the async runtime. A panic inside the
/// closure is resumed on the calling task.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> Result<T, HandlerError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(res) => res,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(HandlerError::Other(format!("blocking transfer task: {e}"))),
    }
}
