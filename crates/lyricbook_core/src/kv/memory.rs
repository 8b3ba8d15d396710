//! In-process key-value store.

use super::{KeyValueStore, KvResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Heap-backed store; clones share the same underlying map.
///
/// Stands in for a second process or UI surface sharing one storage medium.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave a half-written value.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get_item(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> KvResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> KvResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}
