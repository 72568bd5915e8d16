//! Configuration for the draw dispatcher
use crate::error::DispatchError;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Trigger calls issued before each pause
    pub batch_size: u32,

    /// Pause after each full batch, in seconds (fractions allowed)
    pub wait_seconds: f64,

    /// Orchestrator REST API base, e.g. `http://prefect:4200/api`
    pub orchestrator_api_url: String,

    /// Deployment that fetches one draw, addressed as `flow/deployment`
    pub workflow: String,

    /// Bearer token for hosted orchestrators
    #[serde(default)]
    pub api_key: Option<String>,

    /// Timeout for a single trigger request (acknowledgement only)
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load from `DISPATCHER_*` environment variables on top of defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("batch_size", 10)?
            .set_default("wait_seconds", 60.0)?
            .set_default("orchestrator_api_url", "http://localhost:4200/api")?
            .set_default("workflow", "fetch-lottery-results/fetch-lottery-results")?
            .set_default("request_timeout_secs", 30)?
            .add_source(config::Environment::with_prefix("DISPATCHER").try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.batch_size == 0 {
            return Err(DispatchError::InvalidPolicy(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if Duration::try_from_secs_f64(self.wait_seconds).is_err() {
            return Err(DispatchError::InvalidPolicy(format!(
                "wait_seconds must be a non-negative number of seconds within range, got {}",
                self.wait_seconds
            )));
        }

        if self.orchestrator_api_url.trim().is_empty() {
            return Err(DispatchError::InvalidPolicy(
                "orchestrator_api_url is required".to_string(),
            ));
        }

        if self.workflow.trim().is_empty() {
            return Err(DispatchError::InvalidPolicy(
                "workflow is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Unvalidated values saturate instead of panicking
    pub fn wait(&self) -> Duration {
        Duration::try_from_secs_f64(self.wait_seconds.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
