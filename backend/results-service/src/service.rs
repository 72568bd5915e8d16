//! Data access for the dashboard
//!
//! Every read first makes sure the local copy of the compiled results file is present
//! and fresh, then runs its query on a blocking thread with its own read-only connection.

use crate::cache::{DataFileCache, DataFileHandle, FreshnessPolicy};
use crate::database;
use crate::error::{Result, ServiceError};
use crate::games;
use crate::models::{FrequencyOrder, GameSummary, NumberFrequency, ResultRow, StorageStatus};
use rusqlite::Connection;
use s3_utils::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where the compiled results file lives remotely and locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub bucket: String,
    pub key: String,
    pub local_path: PathBuf,
}

pub struct DataAccessService {
    store: Arc<dyn ObjectStore>,
    cache: DataFileCache,
    source: DataSource,
}

impl DataAccessService {
    pub fn new(store: Arc<dyn ObjectStore>, source: DataSource, policy: FreshnessPolicy) -> Self {
        Self {
            cache: DataFileCache::new(store.clone(), policy),
            store,
            source,
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Local copy of the configured results file
    pub async fn data_file(&self) -> Result<DataFileHandle> {
        self.ensure_local_copy(&self.source.bucket, &self.source.key, &self.source.local_path)
            .await
    }

    pub async fn ensure_local_copy(
        &self,
        bucket: &str,
        key: &str,
        local_path: &std::path::Path,
    ) -> Result<DataFileHandle> {
        let handle = self.cache.ensure_local_copy(bucket, key, local_path).await?;
        if handle.degraded {
            warn!(bucket, key, "Answering from a degraded local copy");
        }
        Ok(handle)
    }

    /// Run a single read-only statement against the file behind `handle`
    pub async fn query(&self, handle: &DataFileHandle, statement: &str) -> Result<Vec<ResultRow>> {
        let statement = statement.to_string();
        with_connection(handle, move |conn| database::query(conn, &statement)).await
    }

    pub async fn latest_results(&self, game_name: &str, limit: u32) -> Result<Vec<ResultRow>> {
        let game_name = games::validate_game(game_name)?.to_string();
        let limit = games::validate_limit(limit)?;

        let handle = self.data_file().await?;
        debug!(game = %game_name, limit, "Fetching latest results");
        with_connection(&handle, move |conn| {
            database::latest_results(conn, &game_name, limit)
        })
        .await
    }

    pub async fn latest_per_game(&self) -> Result<Vec<ResultRow>> {
        let handle = self.data_file().await?;
        with_connection(&handle, database::latest_per_game).await
    }

    pub async fn available_games(&self) -> Result<Vec<GameSummary>> {
        let handle = self.data_file().await?;
        with_connection(&handle, database::available_games).await
    }

    pub async fn draw(&self, game_name: &str, draw_number: i64) -> Result<Option<ResultRow>> {
        let game_name = games::validate_game(game_name)?.to_string();
        if draw_number < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "draw number must be positive, got {draw_number}"
            )));
        }

        let handle = self.data_file().await?;
        with_connection(&handle, move |conn| {
            database::draw_by_number(conn, &game_name, draw_number)
        })
        .await
    }

    /// `limit` of `None` returns every number seen; otherwise the usual limit rules apply
    pub async fn number_frequency(
        &self,
        game_name: &str,
        limit: Option<u32>,
        order: FrequencyOrder,
    ) -> Result<Vec<NumberFrequency>> {
        let game_name = games::validate_game(game_name)?.to_string();
        let limit = limit.map(games::validate_limit).transpose()?;

        let handle = self.data_file().await?;
        with_connection(&handle, move |conn| {
            database::number_frequency(conn, &game_name, limit, order)
        })
        .await
    }

    /// Force the next access to re-sync the local copy
    pub fn invalidate(&self) {
        self.cache.invalidate(&self.source.bucket, &self.source.key);
    }

    pub async fn storage_status(&self) -> StorageStatus {
        let bucket_reachable = match self.store.check_bucket(&self.source.bucket).await {
            Ok(()) => true,
            Err(e) => {
                warn!(bucket = %self.source.bucket, "Bucket check failed: {}", e);
                false
            }
        };

        let (handle_state, handle) = self.cache.snapshot(&self.source.bucket, &self.source.key);

        StorageStatus {
            bucket: self.source.bucket.clone(),
            key: self.source.key.clone(),
            bucket_reachable,
            handle_state,
            last_synced_at: handle.as_ref().map(|h| h.synced_at),
            degraded: handle.map(|h| h.degraded).unwrap_or(false),
        }
    }
}

/// Open the handle's file read-only on a blocking thread and run `f` against it
async fn with_connection<T, F>(handle: &DataFileHandle, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
{
    let path = handle.local_path.clone();
    tokio::task::spawn_blocking(move || {
        let conn = database::open_read_only(&path)?;
        f(&conn)
    })
    .await?
}
