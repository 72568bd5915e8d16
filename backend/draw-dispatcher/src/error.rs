use thiserror::Error;

/// Failure of a single trigger request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriggerError {
    #[error("Orchestrator unreachable: {0}")]
    Unreachable(String),

    #[error("Trigger request timed out: {0}")]
    Timeout(String),

    #[error("Trigger rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid orchestrator endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for TriggerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TriggerError::Timeout(err.to_string())
        } else if err.is_builder() {
            TriggerError::InvalidEndpoint(err.to_string())
        } else if let Some(status) = err.status() {
            TriggerError::Rejected {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            TriggerError::Unreachable(err.to_string())
        }
    }
}

/// A draw whose trigger failed; recorded and skipped, never retried in-run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerFailed {
    pub draw_number: u32,
    pub error: TriggerError,
}

/// Errors that stop a dispatch before any trigger is issued
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid draw range {start}..={end}: {reason}")]
    InvalidRange { start: u32, end: u32, reason: String },

    #[error("Invalid batch policy: {0}")]
    InvalidPolicy(String),
}
