/// Object store configuration shared by the pipeline services
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Custom endpoint (MinIO, Caddy-fronted MinIO, localstack). `None` uses AWS defaults.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Static access key; when absent the default AWS credential chain is used
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket holding raw results and the compiled results file
    #[serde(default = "default_bucket")]
    pub bucket_name: String,
    /// Whether to use path-style URLs (MinIO needs this)
    #[serde(default = "default_path_style")]
    pub path_style: bool,
    /// Per-operation timeout in seconds, covers the full download of an object
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "lottery".to_string()
}

fn default_path_style() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            region: default_region(),
            bucket_name: default_bucket(),
            path_style: default_path_style(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl S3Config {
    /// Load configuration from `S3_*` environment variables
    /// (`S3_ENDPOINT_URL`, `S3_ACCESS_KEY_ID`, `S3_SECRET_ACCESS_KEY`, `S3_REGION`, ...)
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("S3_").from_env()
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Both halves of a static key pair, if configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }

    /// Human-readable location of an object, for logs
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) if self.path_style => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
            }
            _ => format!("s3://{}/{}", bucket, key),
        }
    }
}
