//! Load and save the failure journal (pretty JSON under the XDG state dir).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::PoisonError;

use anyhow::Result;

use crate::album::Album;

use super::{FailureJournal, JournalError};

impl FailureJournal {
    /// Default journal path: `~/.local/state/picflow/fail.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("picflow")?;
        Ok(xdg_dirs.place_state_file("fail.json")?)
    }

    /// Open the journal at `path`. A missing file yields an empty journal;
    /// an unreadable or undecodable file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no failure journal yet");
                return Ok(Self::with_albums(path, BTreeMap::new()));
            }
            Err(source) => return Err(JournalError::Read { path, source }),
        };
        let albums: BTreeMap<String, Album> = match serde_json::from_slice(&bytes) {
            Ok(albums) => albums,
            Err(source) => return Err(JournalError::Decode { path, source }),
        };
        tracing::info!(
            path = %path.display(),
            entries = albums.len(),
            "loaded failure journal"
        );
        Ok(Self::with_albums(path, albums))
    }

    /// Write the full map to disk, replacing the previous file.
    ///
    /// The map is encoded while the entry lock is held and written after it is
    /// released. Bytes go to a temp file in the same directory which is then
    /// renamed over the journal.
    pub fn flush(&self) -> Result<(), JournalError> {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let (json, generation) = {
            let entries = self.lock();
            let json =
                serde_json::to_vec_pretty(&entries.albums).map_err(JournalError::Encode)?;
            (json, entries.generation)
        };

        write_replace(&self.path, &json).map_err(|source| JournalError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.flushed.store(generation, Ordering::Release);
        tracing::debug!(path = %self.path.display(), bytes = json.len(), "flushed failure journal");
        Ok(())
    }
}

fn write_replace(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
