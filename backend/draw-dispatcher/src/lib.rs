//! Draw Dispatcher - paced backfill of lottery draw runs
//!
//! Triggers one orchestrator run per draw number in a range, pausing after
//! every batch so the orchestrator's admission control is never flooded.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod trigger;

pub use config::Config;
pub use dispatcher::{BatchDispatcher, BatchPolicy, DispatchReport, DrawRange};
pub use error::{DispatchError, TriggerError, TriggerFailed};
pub use trigger::{OrchestratorClient, RunAck, RunRequest, RunTrigger};
