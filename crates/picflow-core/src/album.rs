//! Album: one unit of download-or-forward work.
//!
//! An album is identified by `id` inside its `tag` namespace. Ids are compared
//! lexicographically; the per-tag progress cursor holds the greatest id that
//! completed successfully (see [`crate::progress`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One album as produced by a scanner or re-created from the failure journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Album identifier, ordered lexicographically within its tag.
    pub id: String,
    /// Source stream this album belongs to; each tag has its own cursor.
    pub tag: String,
    /// True when re-submitted from the failure journal.
    #[serde(default)]
    pub is_retry: bool,
    #[serde(default)]
    pub title: String,
    /// Picture URLs making up the album.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Request headers for the handler. Transient: never journaled.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Extra handler context (e.g. a scraped page fragment). Transient: never journaled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Album {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            is_retry: false,
            title: String::new(),
            urls: Vec::new(),
            headers: BTreeMap::new(),
            payload: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Snapshot stored in the failure journal: same identity and URLs,
    /// with headers and payload dropped.
    pub fn minimized(&self) -> Album {
        Album {
            id: self.id.clone(),
            tag: self.tag.clone(),
            is_retry: self.is_retry,
            title: self.title.clone(),
            urls: self.urls.clone(),
            headers: BTreeMap::new(),
            payload: None,
        }
    }

    /// Re-create this album for another attempt.
    pub fn into_retry(mut self) -> Album {
        self.is_retry = true;
        self
    }
}
