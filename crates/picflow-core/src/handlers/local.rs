//! Save an album's pictures to the local disk.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::album::Album;

use super::naming::{album_dir_name, picture_file_name, sanitize_component};
use super::{run_blocking, transfer, AlbumHandler, HandlerError};

/// Downloads every picture of an album into
/// `<save_dir>/<tag>/<id>_<title>/NNN_<name>`.
///
/// Pictures already present (non-empty) are skipped, so a retried album only
/// fetches what is missing.
#[derive(Debug, Clone)]
pub struct LocalSaver {
    save_dir: PathBuf,
}

impl LocalSaver {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// Directory the album's pictures land in.
    pub fn album_dir(&self, album: &Album) -> PathBuf {
        let tag = match sanitize_component(&album.tag) {
            t if t.is_empty() => "untagged".to_string(),
            t => t,
        };
        self.save_dir.join(tag).join(album_dir_name(album))
    }
}

#[async_trait]
impl AlbumHandler for LocalSaver {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn handle(&self, album: &Album) -> Result<(), HandlerError> {
        if album.urls.is_empty() {
            return Err(HandlerError::NoUrls(album.id.clone()));
        }

        let dir = self.album_dir(album);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| HandlerError::Io {
                path: dir.clone(),
                source,
            })?;

        for (index, url) in album.urls.iter().enumerate() {
            let dest = dir.join(picture_file_name(url, index));
            if let Ok(meta) = tokio::fs::metadata(&dest).await {
                if meta.len() > 0 {
                    tracing::debug!(path = %dest.display(), "picture already saved");
                    continue;
                }
            }

            let url = url.clone();
            let headers = album.headers.clone();
            let bytes = run_blocking(move || transfer::fetch_to_file(&url, &headers, &dest)).await?;
            tracing::trace!(id = %album.id, index, bytes, "picture saved");
        }
        Ok(())
    }
}
