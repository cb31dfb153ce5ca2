use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use ahash::HashMap;
use tokio::sync::OnceCell;

use super::Schema;

/// A subject's resolved id together with the schema it was resolved for.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub schema_id: i32,
    pub schema: Arc<Schema>,
}

/// Subject to schema id map with at most one successful resolution per subject.
///
/// The map lock is only held to fetch the subject's cell; resolution itself
/// runs under the cell, so different subjects resolve concurrently while
/// callers racing on the same subject wait for the first one.
#[derive(Debug, Default)]
pub struct SchemaIdCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<CacheEntry>>>>,
}

impl SchemaIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: &str) -> Option<CacheEntry> {
        self.lock()
            .get(subject)
            .and_then(|cell| cell.get().cloned())
    }

    /// Returns the cached entry for `subject`, running `resolve` on a miss.
    ///
    /// Concurrent callers share a single successful resolution. A failed
    /// resolution is not cached: each caller that was waiting on it then runs
    /// its own resolver in turn, so N callers racing on a failing subject may
    /// make up to N registry calls.
    pub async fn get_or_resolve<F, Fut, E>(&self, subject: &str, resolve: F) -> Result<CacheEntry, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheEntry, E>>,
    {
        let cell = self.cell(subject);

        if let Some(entry) = cell.get() {
            return Ok(entry.clone());
        }

        cell.get_or_try_init(resolve).await.cloned()
    }

    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, subject: &str) -> Arc<OnceCell<CacheEntry>> {
        let mut entries = self.lock();

        match entries.get(subject) {
            Some(cell) => Arc::clone(cell),
            None => {
                let cell = Arc::new(OnceCell::new());
                entries.insert(subject.to_owned(), Arc::clone(&cell));
                cell
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<OnceCell<CacheEntry>>>> {
        // entries are only ever inserted, a panicking holder cannot leave them torn
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
