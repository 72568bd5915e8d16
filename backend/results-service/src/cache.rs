//! Local copies of object-store files
//!
//! One handle per `(bucket, key)`. The handle moves
//! `Absent -> Syncing -> Fresh -> Stale -> Syncing -> Fresh ...`; a stale handle is
//! only re-synced when somebody asks for it. Concurrent callers for the same key share
//! one sync: the first takes the per-key lock and downloads, the rest wait on the lock
//! and reuse what it stored.

use crate::error::{Result, ServiceError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use s3_utils::ObjectStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How long a local copy may be served before the next access re-syncs it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessPolicy {
    /// Re-download on every access
    Always,
    MaxAge(Duration),
}

impl FreshnessPolicy {
    pub fn is_fresh(&self, synced_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            FreshnessPolicy::Always => false,
            FreshnessPolicy::MaxAge(max_age) => now
                .signed_duration_since(synced_at)
                .to_std()
                // synced_at in the future (clock skew on an adopted file) counts as fresh
                .map(|age| age < *max_age)
                .unwrap_or(true),
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        FreshnessPolicy::MaxAge(Duration::from_secs(3600))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleState {
    Absent,
    Syncing,
    Fresh,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileHandle {
    pub bucket: String,
    pub key: String,
    pub local_path: PathBuf,
    pub synced_at: DateTime<Utc>,
    /// Remote ETag seen at sync time; `None` for a file adopted from disk
    pub etag: Option<String>,
    /// Served from the last local copy because the store could not be reached
    pub degraded: bool,
}

#[derive(Default)]
struct Slot {
    handle: Mutex<Option<DataFileHandle>>,
    invalidated: AtomicBool,
}

pub struct DataFileCache {
    store: Arc<dyn ObjectStore>,
    policy: FreshnessPolicy,
    slots: DashMap<(String, String), Arc<Slot>>,
}

impl DataFileCache {
    pub fn new(store: Arc<dyn ObjectStore>, policy: FreshnessPolicy) -> Self {
        Self {
            store,
            policy,
            slots: DashMap::new(),
        }
    }

    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }

    fn slot(&self, bucket: &str, key: &str) -> Arc<Slot> {
        // Clone out of the map so no shard lock is held across an await
        Arc::clone(
            self.slots
                .entry((bucket.to_string(), key.to_string()))
                .or_default()
                .value(),
        )
    }

    /// Return a handle to a local copy of `(bucket, key)` at `local_path`, syncing it first
    /// when it is missing or stale
    pub async fn ensure_local_copy(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<DataFileHandle> {
        let slot = self.slot(bucket, key);
        let mut current = slot.handle.lock().await;

        if current.is_none() {
            *current = adopt_existing(bucket, key, local_path).await;
        }

        if let Some(handle) = current.as_ref() {
            if handle.local_path == local_path
                && !handle.degraded
                && !slot.invalidated.load(Ordering::SeqCst)
                && self.policy.is_fresh(handle.synced_at, Utc::now())
            {
                debug!(bucket, key, "Local copy is fresh");
                return Ok(handle.clone());
            }
        }

        // An invalidation arriving after this point applies to the copy being synced now
        slot.invalidated.store(false, Ordering::SeqCst);

        let previous = current
            .as_ref()
            .filter(|handle| handle.local_path == local_path);

        match self.sync(bucket, key, local_path, previous).await {
            Ok(handle) => {
                *current = Some(handle.clone());
                Ok(handle)
            }
            Err(ServiceError::StorageUnavailable(reason)) => {
                let Some(modified) = file_modified(local_path).await else {
                    return Err(ServiceError::StorageUnavailable(reason));
                };
                warn!(
                    bucket,
                    key,
                    path = %local_path.display(),
                    "Object store unavailable, serving last local copy: {}",
                    reason
                );
                let handle = DataFileHandle {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    local_path: local_path.to_path_buf(),
                    synced_at: previous.map(|h| h.synced_at).unwrap_or(modified),
                    etag: previous.and_then(|h| h.etag.clone()),
                    degraded: true,
                };
                *current = Some(handle.clone());
                Ok(handle)
            }
            Err(e) => Err(e),
        }
    }

    async fn sync(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        previous: Option<&DataFileHandle>,
    ) -> Result<DataFileHandle> {
        let metadata = self.store.head_object(bucket, key).await?;

        let known_etag = previous.and_then(|h| h.etag.as_deref());
        if self.policy != FreshnessPolicy::Always
            && known_etag.is_some()
            && known_etag == metadata.etag.as_deref()
            && file_modified(local_path).await.is_some()
        {
            debug!(bucket, key, etag = ?metadata.etag, "Remote object unchanged, renewing local copy");
            return Ok(self.handle(bucket, key, local_path, metadata.etag));
        }

        let body = self.store.get_object(bucket, key).await?;
        let size = body.len();

        write_atomically(local_path, &body).await?;

        info!(
            bucket,
            key,
            size,
            path = %local_path.display(),
            "Downloaded object to local copy"
        );

        Ok(self.handle(bucket, key, local_path, metadata.etag))
    }

    fn handle(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        etag: Option<String>,
    ) -> DataFileHandle {
        DataFileHandle {
            bucket: bucket.to_string(),
            key: key.to_string(),
            local_path: local_path.to_path_buf(),
            synced_at: Utc::now(),
            etag,
            degraded: false,
        }
    }

    /// Mark the handle stale; the next access re-syncs it
    pub fn invalidate(&self, bucket: &str, key: &str) {
        if let Some(slot) = self.slots.get(&(bucket.to_string(), key.to_string())) {
            slot.invalidated.store(true, Ordering::SeqCst);
            info!(bucket, key, "Local copy invalidated");
        }
    }

    pub fn state(&self, bucket: &str, key: &str) -> HandleState {
        self.snapshot(bucket, key).0
    }

    /// Current state plus the handle it refers to, without waiting on an in-flight sync
    pub fn snapshot(&self, bucket: &str, key: &str) -> (HandleState, Option<DataFileHandle>) {
        let Some(slot) = self
            .slots
            .get(&(bucket.to_string(), key.to_string()))
            .map(|entry| Arc::clone(entry.value()))
        else {
            return (HandleState::Absent, None);
        };

        let Ok(current) = slot.handle.try_lock() else {
            return (HandleState::Syncing, None);
        };

        match current.as_ref() {
            None => (HandleState::Absent, None),
            Some(handle) => {
                let fresh = !handle.degraded
                    && !slot.invalidated.load(Ordering::SeqCst)
                    && self.policy.is_fresh(handle.synced_at, Utc::now());
                let state = if fresh {
                    HandleState::Fresh
                } else {
                    HandleState::Stale
                };
                (state, Some(handle.clone()))
            }
        }
    }
}

async fn file_modified(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

/// A file left by a previous run counts as synced at its modification time
async fn adopt_existing(bucket: &str, key: &str, local_path: &Path) -> Option<DataFileHandle> {
    let synced_at = file_modified(local_path).await?;
    info!(
        bucket,
        key,
        path = %local_path.display(),
        synced_at = %synced_at,
        "Adopting existing local copy"
    );
    Some(DataFileHandle {
        bucket: bucket.to_string(),
        key: key.to_string(),
        local_path: local_path.to_path_buf(),
        synced_at,
        etag: None,
        degraded: false,
    })
}

/// Write `body` to a temporary file next to `path`, fsync it, then rename it into place.
/// Readers see either the old file or the complete new one.
async fn write_atomically(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    let tmp_path = dir.join(format!(".{}.{}.part", file_name, uuid::Uuid::new_v4()));

    let result = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(body).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp_path).await;
    }
    result
}
