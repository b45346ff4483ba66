//! Process-local cache of file metadata keyed by file id.
//!
//! Entries are added once and never expire: content stored under an id is
//! immutable on the service side. [`MetadataCache::evict`] drops a record
//! whose downloaded body turned out to be corrupt. A miss is resolved by a single fetch per id,
//! however many callers race on it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use filedock_protocol::FileId;
use tokio::sync::OnceCell;

use crate::types::FileRecord;

type Slot = Arc<OnceCell<Arc<FileRecord>>>;

/// Single-flight cache of [`FileRecord`]s.
#[derive(Default)]
pub struct MetadataCache {
    slots: Mutex<HashMap<FileId, Slot>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached record for `id`, fetching it on a miss.
    ///
    /// Concurrent callers for the same id share one `fetch` call and all
    /// receive the same `Arc`. Callers for other ids are never blocked by it.
    /// A failed fetch caches nothing; the next caller fetches again.
    pub async fn get_or_fetch<F, Fut, E>(&self, id: FileId, fetch: F) -> Result<Arc<FileRecord>, E>
    where
        F: FnOnce(FileId) -> Fut,
        Fut: Future<Output = Result<FileRecord, E>>,
    {
        let slot = self.slot(id);
        let result = slot
            .get_or_try_init(|| async move { fetch(id).await.map(Arc::new) })
            .await
            .map(Arc::clone);
        if result.is_err() {
            self.release(id, &slot);
        }
        result
    }

    /// Inserts `record` unless `id` is already cached or being fetched.
    ///
    /// Returns `true` if the record was inserted.
    pub fn insert_if_absent(&self, id: FileId, record: Arc<FileRecord>) -> bool {
        self.slot(id).set(record).is_ok()
    }

    /// Drops the entry for `id` if it still holds `record`.
    ///
    /// Returns `true` if an entry was removed. Holders of the record keep it;
    /// the next lookup fetches a fresh one.
    pub fn evict(&self, id: FileId, record: &FileRecord) -> bool {
        let mut slots = self.lock();
        let holds = slots
            .get(&id)
            .and_then(|slot| slot.get())
            .is_some_and(|cached| std::ptr::eq(Arc::as_ptr(cached), record));
        if holds {
            slots.remove(&id);
        }
        holds
    }

    /// Returns the cached record for `id` without fetching.
    pub fn get(&self, id: FileId) -> Option<Arc<FileRecord>> {
        self.lock().get(&id).and_then(|slot| slot.get().cloned())
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: FileId) -> Slot {
        let mut slots = self.lock();
        Arc::clone(slots.entry(id).or_default())
    }

    /// Removes the empty slot left by a failed fetch unless another caller
    /// still holds it.
    fn release(&self, id: FileId, slot: &Slot) {
        let mut slots = self.lock();
        let idle = !slot.initialized()
            && Arc::strong_count(slot) == 2
            && slots.get(&id).is_some_and(|current| Arc::ptr_eq(current, slot));
        if idle {
            slots.remove(&id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FileId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("entries", &self.len())
            .finish()
    }
}
