/// Shared object store utilities for the lottery results pipeline
///
/// Provides the S3 / MinIO client, its configuration, and the `ObjectStore`
/// trait the services program against.

use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::info;

pub mod config;
pub mod memory;
pub mod operations;
pub mod store;

pub use config::S3Config;
pub use memory::InMemoryObjectStore;
pub use operations::S3Operations;
pub use store::{ObjectMetadata, ObjectStore, ObjectStoreError, ObjectStoreResult};

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Create new S3 client with configuration from environment
    pub async fn from_env() -> Result<Self, envy::Error> {
        let config = S3Config::from_env()?;
        Ok(Self::with_config(config).await)
    }

    /// Create new S3 client with custom configuration
    pub async fn with_config(config: S3Config) -> Self {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(config.operation_timeout())
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(timeouts);

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some((access_key, secret_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "s3-utils-static",
            ));
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .build();

        info!(
            endpoint = config.endpoint_url.as_deref().unwrap_or("aws-default"),
            region = %config.region,
            bucket = %config.bucket_name,
            "S3 client initialized"
        );

        Self {
            client: Arc::new(Client::from_conf(s3_config)),
            config,
        }
    }

    /// Get reference to underlying AWS S3 client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Object operations bound to this client
    pub fn operations(&self) -> S3Operations {
        S3Operations::new(Arc::clone(&self.client), self.config.clone())
    }

    /// Health check for S3 connectivity against the configured bucket
    pub async fn health_check(&self) -> ObjectStoreResult<()> {
        self.operations().check_bucket(&self.config.bucket_name).await
    }
}
