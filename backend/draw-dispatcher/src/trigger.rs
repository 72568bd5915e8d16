//! Trigger calls against the workflow orchestrator's REST API
use crate::config::Config;
use crate::error::TriggerError;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One run to schedule: the draw to fetch and the workflow that fetches it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub draw_number: u32,
    pub workflow: String,
}

/// Body sent to the orchestrator; the workflow travels in the path
#[derive(Debug, Serialize)]
struct RunParameters {
    draw_number: u32,
}

#[derive(Debug, Deserialize)]
struct RunCreated {
    #[serde(default)]
    id: Option<String>,
}

/// Acknowledgement of a trigger request (the run itself may still be pending)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAck {
    pub status: u16,
    pub run_id: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunTrigger: Send + Sync {
    async fn trigger(&self, request: &RunRequest) -> Result<RunAck, TriggerError>;
}

/// HTTP client for `POST /deployments/{workflow}/runs`
pub struct OrchestratorClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl OrchestratorClient {
    pub fn new(config: &Config) -> Result<Self, TriggerError> {
        let base_url = Url::parse(&config.orchestrator_api_url)
            .map_err(|e| TriggerError::InvalidEndpoint(format!("{}: {e}", config.orchestrator_api_url)))?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
        })
    }

    /// Run-creation URL; the workflow is a single percent-encoded path segment
    fn runs_url(&self, workflow: &str) -> Result<Url, TriggerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TriggerError::InvalidEndpoint(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(["deployments", workflow, "runs"]);
        Ok(url)
    }
}

#[async_trait]
impl RunTrigger for OrchestratorClient {
    async fn trigger(&self, request: &RunRequest) -> Result<RunAck, TriggerError> {
        let url = self.runs_url(&request.workflow)?;
        debug!(draw_number = request.draw_number, url = %url, "Sending trigger request");

        let mut builder = self.client.post(url).json(&RunParameters {
            draw_number: request.draw_number,
        });
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            // The run id is informative only; an empty or foreign body still counts as accepted
            let run_id = response
                .json::<RunCreated>()
                .await
                .ok()
                .and_then(|created| created.id);

            Ok(RunAck {
                status: status.as_u16(),
                run_id,
            })
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            Err(TriggerError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
