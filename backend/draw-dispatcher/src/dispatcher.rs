//! Paced dispatch of one run per draw number
//!
//! Walks an inclusive draw range in ascending order, triggering one run per
//! draw and sleeping after every full batch so the orchestrator never sees
//! more than `batch_size` requests back to back. A failed trigger is recorded
//! and the walk continues.

use crate::config::Config;
use crate::error::{DispatchError, TriggerFailed};
use crate::trigger::{RunRequest, RunTrigger};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Inclusive range of draw numbers, `1 <= start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    start: u32,
    end: u32,
}

impl DrawRange {
    pub fn new(start: u32, end: u32) -> Result<Self, DispatchError> {
        if start == 0 {
            return Err(DispatchError::InvalidRange {
                start,
                end,
                reason: "draw numbers start at 1".to_string(),
            });
        }
        if start > end {
            return Err(DispatchError::InvalidRange {
                start,
                end,
                reason: "start must not exceed end".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// Burst size and the pause that follows each full burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchPolicy {
    batch_size: u32,
    wait: Duration,
}

impl BatchPolicy {
    pub fn new(batch_size: u32, wait: Duration) -> Result<Self, DispatchError> {
        if batch_size == 0 {
            return Err(DispatchError::InvalidPolicy(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(Self { batch_size, wait })
    }

    pub fn from_config(config: &Config) -> Result<Self, DispatchError> {
        config.validate()?;
        Self::new(config.batch_size, config.wait())
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Pauses a range of `len` draws will take: one per full batch, none after a partial one
    pub fn expected_pauses(&self, len: u64) -> u64 {
        len / u64::from(self.batch_size)
    }
}

/// Statistics from a dispatch run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DispatchReport {
    /// Draws whose trigger was acknowledged, in issue order
    pub triggered: Vec<u32>,
    pub failures: Vec<TriggerFailed>,
    pub pauses: u64,
    pub batches_completed: u64,
}

impl DispatchReport {
    pub fn total_issued(&self) -> u64 {
        (self.triggered.len() + self.failures.len()) as u64
    }

    pub fn failed_draws(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.draw_number).collect()
    }
}

pub struct BatchDispatcher {
    trigger: Arc<dyn RunTrigger>,
    policy: BatchPolicy,
    workflow: String,
}

impl BatchDispatcher {
    pub fn new(trigger: Arc<dyn RunTrigger>, policy: BatchPolicy, workflow: impl Into<String>) -> Self {
        Self {
            trigger,
            policy,
            workflow: workflow.into(),
        }
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Trigger one run per draw in `range`, pausing after every full batch.
    ///
    /// Only invalid input returns `Err`; trigger failures are reported in the
    /// returned [`DispatchReport`].
    pub async fn run(&self, range: DrawRange) -> Result<DispatchReport, DispatchError> {
        info!(
            start = range.start(),
            end = range.end(),
            total = range.len(),
            batch_size = self.policy.batch_size,
            wait_secs = self.policy.wait.as_secs_f64(),
            workflow = %self.workflow,
            "Starting draw dispatch"
        );

        let mut report = DispatchReport::default();
        let mut issued_since_pause: u32 = 0;

        for draw_number in range.iter() {
            let request = RunRequest {
                draw_number,
                workflow: self.workflow.clone(),
            };

            match self.trigger.trigger(&request).await {
                Ok(ack) => {
                    info!(
                        draw_number,
                        status = ack.status,
                        run_id = ack.run_id.as_deref().unwrap_or("-"),
                        "Triggered run"
                    );
                    report.triggered.push(draw_number);
                }
                Err(e) => {
                    error!(draw_number, error = %e, "Failed to trigger run");
                    report.failures.push(TriggerFailed {
                        draw_number,
                        error: e,
                    });
                }
            }

            issued_since_pause += 1;
            if issued_since_pause == self.policy.batch_size {
                report.batches_completed += 1;
                info!(
                    batch = report.batches_completed,
                    last_draw = draw_number,
                    wait_secs = self.policy.wait.as_secs_f64(),
                    "Batch complete, pausing"
                );
                if !self.policy.wait.is_zero() {
                    tokio::time::sleep(self.policy.wait).await;
                }
                report.pauses += 1;
                issued_since_pause = 0;
            }
        }

        if issued_since_pause > 0 {
            report.batches_completed += 1;
        }

        if report.failures.is_empty() {
            info!(
                triggered = report.triggered.len(),
                batches = report.batches_completed,
                pauses = report.pauses,
                "Draw dispatch completed"
            );
        } else {
            warn!(
                triggered = report.triggered.len(),
                failed = report.failures.len(),
                failed_draws = ?report.failed_draws(),
                "Draw dispatch completed with failures"
            );
        }

        Ok(report)
    }
}
