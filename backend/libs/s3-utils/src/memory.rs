//! In-process object store for tests and local runs without MinIO

use crate::store::{ObjectMetadata, ObjectStore, ObjectStoreError, ObjectStoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    unavailable: AtomicBool,
    get_unavailable: AtomicBool,
    latency_ms: AtomicU64,
    version: AtomicU64,
    get_calls: AtomicU64,
    head_calls: AtomicU64,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `Unavailable` until cleared
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail only `get_object` with `Unavailable`, as when a download breaks off after a
    /// successful HEAD
    pub fn set_get_unavailable(&self, unavailable: bool) {
        self.get_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay applied to every `get_object` call
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn head_calls(&self) -> u64 {
        self.head_calls.load(Ordering::SeqCst)
    }

    /// Insert an object directly, bypassing the outage switch
    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let object = StoredObject {
            etag: format!("\"{:x}-{}\"", body.len(), version),
            body,
            content_type: "application/octet-stream".to_string(),
            last_modified: Utc::now(),
        };
        self.lock()
            .insert((bucket.to_string(), key.to_string()), object);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), StoredObject>> {
        // A panicking test thread must not wedge the others
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_available(&self) -> ObjectStoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(ObjectStoreError::Unavailable(
                "connection refused (simulated outage)".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<Vec<u8>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        self.ensure_available()?;
        if self.get_unavailable.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable(
                "download interrupted (simulated)".to_string(),
            ));
        }
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| object.body.clone())
            .ok_or_else(|| ObjectStoreError::not_found(bucket, key))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> ObjectStoreResult<()> {
        self.ensure_available()?;
        self.insert(bucket, key, body);
        if let Some(object) = self.lock().get_mut(&(bucket.to_string(), key.to_string())) {
            object.content_type = content_type.to_string();
        }
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<ObjectMetadata> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| ObjectMetadata {
                size: object.body.len() as u64,
                content_type: Some(object.content_type.clone()),
                last_modified: Some(object.last_modified),
                etag: Some(object.etag.clone()),
            })
            .ok_or_else(|| ObjectStoreError::not_found(bucket, key))
    }

    async fn check_bucket(&self, _bucket: &str) -> ObjectStoreResult<()> {
        self.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_object_is_not_found() {
        let store = InMemoryObjectStore::new();
        let err = store.get_object("lottery", "missing.db").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_put_then_head_reports_new_etag() {
        let store = InMemoryObjectStore::new();
        store
            .put_object("lottery", "a.db", vec![1, 2, 3], "application/x-sqlite3")
            .await
            .unwrap();
        let first = store.head_object("lottery", "a.db").await.unwrap();

        store
            .put_object("lottery", "a.db", vec![1, 2, 3], "application/x-sqlite3")
            .await
            .unwrap();
        let second = store.head_object("lottery", "a.db").await.unwrap();

        assert_eq!(first.size, 3);
        assert_eq!(second.content_type.as_deref(), Some("application/x-sqlite3"));
        assert_ne!(first.etag, second.etag);
    }

    #[tokio::test]
    async fn test_outage_fails_every_operation() {
        let store = InMemoryObjectStore::new();
        store.insert("lottery", "a.db", vec![0]);
        store.set_unavailable(true);

        assert!(matches!(
            store.get_object("lottery", "a.db").await,
            Err(ObjectStoreError::Unavailable(_))
        ));
        assert!(store.check_bucket("lottery").await.is_err());

        store.set_unavailable(false);
        assert_eq!(store.get_object("lottery", "a.db").await.unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_get_only_outage_keeps_head_working() {
        let store = InMemoryObjectStore::new();
        store.insert("lottery", "a.db", vec![0]);
        store.set_get_unavailable(true);

        assert!(store.head_object("lottery", "a.db").await.is_ok());
        assert!(matches!(
            store.get_object("lottery", "a.db").await,
            Err(ObjectStoreError::Unavailable(_))
        ));
    }
}
