use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn collection_names(&self) -> Result<Vec<String>, StoreError>;

    async fn count_documents(&self, collection: &str) -> Result<u64, StoreError>;

    /// Deletes every document in `collection` and returns how many went.
    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, u64>>,
    failing: BTreeSet<String>,
    offline: bool,
    accesses: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(self, name: &str, documents: u64) -> Self {
        if let Ok(mut collections) = self.collections.lock() {
            collections.insert(name.to_string(), documents);
        }
        self
    }

    /// Every operation on `name` fails.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn count(&self, name: &str) -> u64 {
        self.collections
            .lock()
            .ok()
            .and_then(|c| c.get(name).copied())
            .unwrap_or(0)
    }

    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    fn touch(&self, collection: Option<&str>) -> Result<(), StoreError> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        match collection {
            Some(name) if self.failing.contains(name) => Err(StoreError::Unavailable(format!(
                "connection reset while reading {name}"
            ))),
            _ => Ok(()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, u64>>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.touch(None)?;
        if self.offline {
            return Err(StoreError::Unavailable("server selection timeout".to_string()));
        }
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        self.touch(None)?;
        Ok(self.lock()?.keys().cloned().collect())
    }

    async fn count_documents(&self, collection: &str) -> Result<u64, StoreError> {
        self.touch(Some(collection))?;
        Ok(self.lock()?.get(collection).copied().unwrap_or(0))
    }

    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        self.touch(Some(collection))?;
        let mut collections = self.lock()?;
        Ok(collections
            .get_mut(collection)
            .map(std::mem::take)
            .unwrap_or(0))
    }
}
