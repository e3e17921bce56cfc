//! In-process object store.
//!
//! Backs local runs and tests. Failures can be injected per object so callers
//! can exercise each storage error path without a network.

use crate::error::StorageError;
use crate::store::{ObjectData, ObjectRef, ObjectStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectRef, ObjectData>>,
    get_failures: RwLock<HashMap<ObjectRef, StorageError>>,
    put_failures: RwLock<HashMap<ObjectRef, StorageError>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a put
    pub fn insert(&self, object: ObjectRef, data: ObjectData) {
        self.objects.write().insert(object, data);
    }

    pub fn object(&self, object: &ObjectRef) -> Option<ObjectData> {
        self.objects.read().get(object).cloned()
    }

    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.objects.read().contains_key(object)
    }

    /// Make every `get` of `object` fail with `error`
    pub fn fail_get(&self, object: ObjectRef, error: StorageError) {
        self.get_failures.write().insert(object, error);
    }

    /// Make every `put` to `object` fail with `error`
    pub fn fail_put(&self, object: ObjectRef, error: StorageError) {
        self.put_failures.write().insert(object, error);
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, object: &ObjectRef) -> Result<ObjectData, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.get_failures.read().get(object) {
            return Err(err.clone());
        }

        self.object(object)
            .ok_or_else(|| StorageError::not_found(object))
    }

    async fn put(&self, object: &ObjectRef, data: ObjectData) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.put_failures.read().get(object) {
            return Err(err.clone());
        }

        self.insert(object.clone(), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryObjectStore::new();
        let object = ObjectRef::new("bucket", "a.png");

        store
            .put(&object, ObjectData::new(vec![1u8, 2, 3], "image/png"))
            .await
            .unwrap();

        let data = store.get(&object).await.unwrap();
        assert_eq!(data.bytes.as_ref(), &[1, 2, 3]);
        assert_eq!(data.content_type, "image/png");
        assert_eq!(store.get_count(), 1);
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let store = MemoryObjectStore::new();
        let object = ObjectRef::new("bucket", "missing.jpg");

        let err = store.get(&object).await.unwrap_err();
        assert_eq!(err, StorageError::not_found(&object));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryObjectStore::new();
        let object = ObjectRef::new("bucket", "a.png");

        store.put(&object, ObjectData::new(vec![1u8], "image/png")).await.unwrap();
        store.put(&object, ObjectData::new(vec![2u8], "image/png")).await.unwrap();

        assert_eq!(store.object(&object).unwrap().bytes.as_ref(), &[2]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryObjectStore::new();
        let object = ObjectRef::new("bucket", "a.png");
        store.insert(object.clone(), ObjectData::new(vec![1u8], "image/png"));

        store.fail_get(object.clone(), StorageError::access_denied(&object));
        store.fail_put(object.clone(), StorageError::TransientIo("reset".into()));

        assert_eq!(
            store.get(&object).await.unwrap_err(),
            StorageError::access_denied(&object)
        );
        let err = store
            .put(&object, ObjectData::new(vec![9u8], "image/png"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        // failed put leaves the stored object untouched
        assert_eq!(store.object(&object).unwrap().bytes.as_ref(), &[1]);
    }
}
