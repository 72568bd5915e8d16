/// S3 operations backing the `ObjectStore` trait
use crate::config::S3Config;
use crate::store::{ObjectMetadata, ObjectStore, ObjectStoreError, ObjectStoreResult};
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }
}

/// Map an SDK failure onto the store taxonomy. `not_found` is the operation-specific
/// check for the modeled "missing key" error.
fn classify<E, R>(
    err: SdkError<E, R>,
    bucket: &str,
    key: &str,
    not_found: impl Fn(&E) -> bool,
) -> ObjectStoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    match &err {
        SdkError::ServiceError(service_err) if not_found(service_err.err()) => {
            ObjectStoreError::not_found(bucket, key)
        }
        SdkError::TimeoutError(_) => {
            ObjectStoreError::Unavailable(format!("request timed out for s3://{bucket}/{key}"))
        }
        SdkError::DispatchFailure(_) => ObjectStoreError::Unavailable(format!(
            "failed to reach object store for s3://{bucket}/{key}: {err}"
        )),
        _ => ObjectStoreError::Unavailable(format!("s3://{bucket}/{key}: {err}")),
    }
}

fn to_chrono(value: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(value.secs(), value.subsec_nanos())
}

#[async_trait]
impl ObjectStore for S3Operations {
    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<Vec<u8>> {
        debug!(url = %self.config.object_url(bucket, key), "Downloading object");

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, bucket, key, |e| e.is_no_such_key()))?;

        // A body that breaks off mid-stream is a connectivity failure, never a short file
        let body = response.body.collect().await.map_err(|e| {
            ObjectStoreError::Unavailable(format!(
                "download of s3://{bucket}/{key} interrupted: {e}"
            ))
        })?;

        Ok(body.into_bytes().to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> ObjectStoreResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| classify(e, bucket, key, |_| false))?;

        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<ObjectMetadata> {
        let response = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, bucket, key, |e| e.is_not_found()))?;

        Ok(ObjectMetadata {
            size: response.content_length().unwrap_or(0).max(0) as u64,
            content_type: response.content_type().map(|s| s.to_string()),
            last_modified: response.last_modified().and_then(to_chrono),
            etag: response.e_tag().map(|s| s.to_string()),
        })
    }

    async fn check_bucket(&self, bucket: &str) -> ObjectStoreResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, bucket, "", |_| false))?;

        Ok(())
    }
}
