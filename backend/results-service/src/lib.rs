//! Results Service
//!
//! Keeps a fresh local copy of the compiled lottery results file from the object
//! store and answers the dashboard's read-only queries over it.

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod games;
pub mod handlers;
pub mod models;
pub mod service;

// Public re-exports
pub use cache::{DataFileCache, DataFileHandle, FreshnessPolicy, HandleState};
pub use config::Config;
pub use error::{Result, ServiceError};
pub use models::{FrequencyOrder, GameSummary, NumberFrequency, ResultRow, StorageStatus};
pub use service::{DataAccessService, DataSource};
