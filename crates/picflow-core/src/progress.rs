//! Per-tag progress cursors.
//!
//! Each tag maps to the greatest album id that completed successfully. The
//! registry owns every cursor behind a single lock; albums only name their tag.
//! Cursors never move backwards, whatever order workers finish in.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared registry of tag -> last completed id.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
    cursors: Mutex<HashMap<String, String>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from persisted cursors (e.g. config targets). Empty ids are treated as unset.
    pub fn from_cursors<I, T, S>(cursors: I) -> Self
    where
        I: IntoIterator<Item = (T, Option<S>)>,
        T: Into<String>,
        S: Into<String>,
    {
        let map: HashMap<String, String> = cursors
            .into_iter()
            .filter_map(|(tag, id)| {
                let id: String = id?.into();
                (!id.is_empty()).then(|| (tag.into(), id))
            })
            .collect();
        Self {
            cursors: Mutex::new(map),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.cursors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the cursor for `tag` to `id` if unset or `id` is greater.
    /// Returns true when the cursor moved.
    pub fn advance(&self, tag: &str, id: &str) -> bool {
        let mut cursors = self.lock();
        if let Some(current) = cursors.get(tag) {
            if id <= current.as_str() {
                return false;
            }
        }
        cursors.insert(tag.to_string(), id.to_string());
        true
    }

    pub fn cursor(&self, tag: &str) -> Option<String> {
        self.lock().get(tag).cloned()
    }

    /// True if `id` is at or below the cursor for `tag`.
    pub fn is_done(&self, tag: &str, id: &str) -> bool {
        self.lock()
            .get(tag)
            .is_some_and(|current| id <= current.as_str())
    }

    /// Copy of every cursor, ordered by tag.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_success_sets_cursor() {
        let reg = ProgressRegistry::new();
        assert!(reg.cursor("T1").is_none());
        assert!(reg.advance("T1", "a"));
        assert_eq!(reg.cursor("T1").as_deref(), Some("a"));
    }

    #[test]
    fn smaller_id_does_not_regress() {
        let reg = ProgressRegistry::new();
        reg.advance("T1", "c");
        assert!(!reg.advance("T1", "a"));
        assert!(!reg.advance("T1", "c"));
        assert_eq!(reg.cursor("T1").as_deref(), Some("c"));
    }

    #[test]
    fn tags_are_independent() {
        let reg = ProgressRegistry::new();
        reg.advance("T1", "z");
        reg.advance("T2", "b");
        assert_eq!(reg.cursor("T1").as_deref(), Some("z"));
        assert_eq!(reg.cursor("T2").as_deref(), Some("b"));
    }

    #[test]
    fn ordering_is_lexicographic() {
        let reg = ProgressRegistry::new();
        reg.advance("T", "9");
        assert!(!reg.advance("T", "10"), "\"10\" < \"9\" byte-wise");
        assert_eq!(reg.cursor("T").as_deref(), Some("9"));
    }

    #[test]
    fn seeded_cursors_skip_empty_ids() {
        let reg = ProgressRegistry::from_cursors([
            ("a", Some("0100".to_string())),
            ("b", Some(String::new())),
            ("c", None),
        ]);
        assert_eq!(reg.cursor("a").as_deref(), Some("0100"));
        assert!(reg.cursor("b").is_none());
        assert!(reg.cursor("c").is_none());
        assert!(reg.is_done("a", "0099"));
        assert!(reg.is_done("a", "0100"));
        assert!(!reg.is_done("a", "0101"));
        assert!(!reg.is_done("b", "anything"));
    }

    #[test]
    fn concurrent_advances_end_at_max() {
        let reg = Arc::new(ProgressRegistry::new());
        let ids: Vec<String> = (0..200).map(|i| format!("{:04}", i)).collect();
        let handles: Vec<_> = ids
            .chunks(25)
            .rev()
            .map(|chunk| {
                let reg = Arc::clone(&reg);
                let chunk = chunk.to_vec();
                std::thread::spawn(move || {
                    for id in chunk.iter().rev() {
                        reg.advance("T", id);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.cursor("T").as_deref(), Some("0199"));
    }

    #[test]
    fn snapshot_is_sorted_by_tag() {
        let reg = ProgressRegistry::new();
        reg.advance("b", "2");
        reg.advance("a", "1");
        let snap: Vec<_> = reg.snapshot().into_iter().collect();
        assert_eq!(
            snap,
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }
}
