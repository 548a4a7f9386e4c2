//! Concurrency-safe string-keyed metadata attached to requests and responses.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

/// Initial capacity for a freshly created attachment map.
pub const DEFAULT_ATTACHMENT_CAPACITY: usize = 16;

/// A string-to-string map safe for concurrent reads and writes.
///
/// Attachments carry per-call side-channel metadata (trace ids, routing hints,
/// auth tokens) alongside the actual call arguments. A map is owned by exactly
/// one request or response and lives only as long as its owner; it is never
/// shared across calls.
///
/// All methods take `&self`; callers never need external locking.
pub struct Attachments {
    inner: RwLock<HashMap<String, String>>,
}

impl Attachments {
    /// Create an empty map with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ATTACHMENT_CAPACITY)
    }

    /// Create an empty map with a specific capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Look up a key, returning an owned copy of the value.
    pub fn load(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).cloned()
    }

    /// Look up a key, returning the empty string when absent.
    pub fn load_or_default(&self, key: &str) -> String {
        self.load(key).unwrap_or_default()
    }

    /// Insert or overwrite a key.
    pub fn store(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.write().insert(key.into(), value.into());
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.inner.write().remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Visit each entry while `f` returns `true`.
    ///
    /// The read lock is held for the duration of the iteration, so `f` must
    /// not call back into this map.
    pub fn range(&self, mut f: impl FnMut(&str, &str) -> bool) {
        for (k, v) in self.inner.read().iter() {
            if !f(k, v) {
                break;
            }
        }
    }

    /// Produce an independent copy of the current entries.
    ///
    /// The copy shares nothing with the original: later writes to either map
    /// are invisible to the other.
    pub fn copy(&self) -> Attachments {
        let snapshot = self.inner.read();
        let mut map = HashMap::with_capacity(snapshot.len().max(DEFAULT_ATTACHMENT_CAPACITY));
        for (k, v) in snapshot.iter() {
            map.insert(k.clone(), v.clone());
        }
        Self {
            inner: RwLock::new(map),
        }
    }

    /// Snapshot the entries into a plain map.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner.read().clone()
    }
}

impl Default for Attachments {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachments")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
