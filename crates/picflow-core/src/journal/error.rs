//! Failure journal I/O errors.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("read failure journal {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The file exists but is not a valid journal. Never silently replaced.
    #[error("decode failure journal {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("encode failure journal: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("write failure journal {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}
