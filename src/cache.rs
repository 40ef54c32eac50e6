//! Explicit result cache for the dashboard.
//!
//! Results are keyed by the operation that produced them, the post selection
//! they were computed over, and the text column they read. Entries live until
//! the caller invalidates them; the dashboard clears everything after each
//! successful fetch.

use std::collections::HashMap;
use std::sync::Mutex;

/// Which posts an operation ran over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection {
    All,
    Query(String),
}

impl Selection {
    /// `None` or a blank term selects every post.
    pub fn from_param(query: Option<&str>) -> Self {
        match query.map(str::trim) {
            Some(term) if !term.is_empty() => Selection::Query(term.to_string()),
            _ => Selection::All,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Selection::All => "all posts",
            Selection::Query(term) => term,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadPosts,
    Analyze,
}

/// Text column an operation read; `None` for operations that read no text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextColumn {
    None,
    /// Title and body joined.
    FullText,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: Operation,
    pub selection: Selection,
    pub column: TextColumn,
}

impl CacheKey {
    pub fn new(operation: Operation, selection: Selection, column: TextColumn) -> Self {
        Self {
            operation,
            selection,
            column,
        }
    }
}

pub struct ResultCache<V> {
    entries: Mutex<HashMap<CacheKey, V>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        self.lock().insert(key, value);
    }

    /// Cached value for `key`, computing and storing it on a miss. A failed
    /// computation is handed back and nothing is stored, so the next lookup
    /// computes again.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: CacheKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            tracing::debug!(?key, "cache hit");
            return Ok(hit);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drop every entry computed over `selection`.
    pub fn invalidate_selection(&self, selection: &Selection) {
        self.lock().retain(|key, _| &key.selection != selection);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, V>> {
        // A panic while holding the lock leaves a map that is still usable.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
