//! Object store abstraction used by the results service and its tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreError {
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Connectivity failure, timeout, truncated body or a service-side refusal
    #[error("Object store unavailable: {0}")]
    Unavailable(String),
}

impl ObjectStoreError {
    pub fn not_found(bucket: &str, key: &str) -> Self {
        ObjectStoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ObjectStoreError::NotFound { .. })
    }
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

/// Blob operations addressed by `(bucket, key)`
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the full object body
    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<Vec<u8>>;

    /// Upload an object, replacing any previous version
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> ObjectStoreResult<()>;

    /// Fetch metadata without downloading the body
    async fn head_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<ObjectMetadata>;

    /// Verify the bucket is reachable with the configured credentials
    async fn check_bucket(&self, bucket: &str) -> ObjectStoreResult<()>;
}
