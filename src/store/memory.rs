//! In-process list store.
//!
//! Same semantics as the Redis store, backed by a mutex-guarded map of
//! deques. Clones share the same lists, so a producer and several consumers
//! can be wired to one instance in tests and demos.

use super::ListStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Default)]
pub struct MemoryStore {
    lists: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the list at `key`, head first.
    pub fn snapshot(&self, key: &str) -> Vec<String> {
        self.lock()
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<String>>> {
        // A panic while holding the lock cannot leave a deque half-updated.
        self.lists.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn push_back(&self, key: &str, value: String) -> Result<u64> {
        let mut lists = self.lock();
        let list = lists.entry(key.to_string()).or_default();
        list.push_back(value);
        Ok(list.len() as u64)
    }

    async fn pop_front(&self, key: &str) -> Result<Option<String>> {
        let mut lists = self.lock();
        let Some(list) = lists.get_mut(key) else {
            return Ok(None);
        };
        let value = list.pop_front();
        // Redis deletes a key once its list is empty.
        if list.is_empty() {
            lists.remove(key);
        }
        Ok(value)
    }

    async fn len(&self, key: &str) -> Result<u64> {
        Ok(self.lock().get(key).map_or(0, |list| list.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_are_isolated_by_key() {
        let store = MemoryStore::new();
        store.push_back("a", "1".to_string()).await.unwrap();
        store.push_back("b", "2".to_string()).await.unwrap();

        assert_eq!(store.pop_front("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.pop_front("a").await.unwrap(), None);
        assert_eq!(store.len("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clones_share_lists() {
        let store = MemoryStore::new();
        let other = store.clone();
        assert_eq!(store.push_back("k", "x".to_string()).await.unwrap(), 1);
        assert_eq!(other.push_back("k", "y".to_string()).await.unwrap(), 2);
        assert_eq!(store.snapshot("k"), vec!["x", "y"]);
        assert!(!other.is_empty("k").await.unwrap());
    }
}
