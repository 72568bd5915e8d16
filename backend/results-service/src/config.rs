use crate::cache::FreshnessPolicy;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP server config
    pub http_host: String,
    pub http_port: u16,

    /// Bucket holding the compiled results file; falls back to `S3_BUCKET_NAME`
    #[serde(default)]
    pub bucket: Option<String>,

    /// Object key of the compiled results file
    pub object_key: String,

    /// Where the local copy lives
    pub local_path: PathBuf,

    /// Max age of the local copy before the next access re-syncs it; 0 = always re-sync
    pub freshness_threshold_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 8080)?
            .set_default("object_key", "lottery_results.db")?
            .set_default("local_path", "data/lottery_results.db")?
            .set_default("freshness_threshold_secs", 3600)? // 1 hour
            .add_source(config::Environment::with_prefix("RESULTS").try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if self.object_key.trim().is_empty() {
            return Err(anyhow!("Object key is required"));
        }

        if self.local_path.as_os_str().is_empty() {
            return Err(anyhow!("Local path is required"));
        }

        if self.local_path.is_dir() {
            return Err(anyhow!(
                "Local path {} is a directory, expected a file path",
                self.local_path.display()
            ));
        }

        Ok(())
    }

    pub fn freshness_policy(&self) -> FreshnessPolicy {
        match self.freshness_threshold_secs {
            0 => FreshnessPolicy::Always,
            secs => FreshnessPolicy::MaxAge(Duration::from_secs(secs)),
        }
    }

    pub fn bucket_or<'a>(&'a self, default_bucket: &'a str) -> &'a str {
        self.bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(default_bucket)
    }
}
