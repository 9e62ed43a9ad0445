//! Forward an album to a remote endpoint as JSON.

use async_trait::async_trait;

use crate::album::Album;

use super::{run_blocking, transfer, AlbumHandler, HandlerError};

/// POSTs the minimized album (id, tag, title, urls) to a webhook-style
/// endpoint. Any non-2xx response is a handler error.
#[derive(Debug, Clone)]
pub struct Forwarder {
    endpoint: String,
}

impl Forwarder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AlbumHandler for Forwarder {
    fn name(&self) -> &'static str {
        "forward"
    }

    async fn handle(&self, album: &Album) -> Result<(), HandlerError> {
        let body = serde_json::to_vec(&album.minimized())?;
        let endpoint = self.endpoint.clone();
        run_blocking(move || transfer::post_json(&endpoint, &body)).await
    }
}
