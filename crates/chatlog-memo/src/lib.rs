//! Per-render-job memoization of asynchronous lookups.
//!
//! A [`MemoCache`] remembers the result of a possibly-suspending computation
//! under a [`MemoKey`]. The first call for a key runs the computation and
//! stores its value; later calls with an identical key return the stored value
//! without running the computation again.
//!
//! A cache is owned by exactly one render job. Nothing is shared between
//! caches, so dropping (or [`clear`](MemoCache::clear)ing) the cache at the end
//! of a job guarantees that lookups never leak into a later job.
//!
//! # Example
//!
//! ```
//! use chatlog_memo::{MemoCache, MemoKey};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let mut cache = MemoCache::new();
//! let key = MemoKey::new("Directory::member").arg(42);
//!
//! let first = cache.memo(key.clone(), || async { "Alice".to_owned() }).await;
//! let second = cache.memo(key, || async { unreachable!() }).await;
//! assert_eq!(first, second);
//! # });
//! ```

mod key;

use std::collections::HashMap;

pub use key::MemoKey;

/// Memo of computed values for one render job.
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: HashMap<MemoKey, V>,
    hits: usize,
    misses: usize,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<V: Clone> MemoCache<V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value stored under `key`, computing and storing it first if
    /// the key has not been seen yet.
    pub async fn memo<F, Fut>(&mut self, key: MemoKey, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.lookup(&key) {
            return value;
        }
        let value = compute().await;
        self.entries.insert(key, value.clone());
        value
    }

    /// Like [`memo`](Self::memo) for fallible computations.
    ///
    /// Only successful results are stored. An error is returned to the caller
    /// and the next call with the same key runs the computation again.
    pub async fn try_memo<F, Fut, E>(&mut self, key: MemoKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    fn lookup(&mut self, key: &MemoKey) -> Option<V> {
        if let Some(value) = self.entries.get(key) {
            self.hits += 1;
            tracing::trace!(%key, "memo hit");
            Some(value.clone())
        } else {
            self.misses += 1;
            tracing::trace!(%key, "memo miss");
            None
        }
    }
}

impl<V> MemoCache<V> {
    /// Stored value for `key`, if any. Does not count as a hit or miss.
    #[must_use]
    pub fn get(&self, key: &MemoKey) -> Option<&V> {
        self.entries.get(key)
    }

    /// Drop every stored value.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Number of lookups that had to run their computation.
    #[must_use]
    pub fn misses(&self) -> usize {
        self.misses
    }
}
