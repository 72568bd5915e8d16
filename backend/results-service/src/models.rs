use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One processed draw as stored in `lottery_results`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub game_name: String,
    pub draw_number: i64,
    pub draw_date: NaiveDate,
    pub file_path: String,
    /// Zero-padded as published, e.g. `["04", "17", "33"]`
    pub winning_numbers: Vec<String>,
    pub prize_tiers: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberFrequency {
    pub number: u32,
    pub frequency: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyOrder {
    /// Most frequent first
    #[default]
    Desc,
    /// Least frequent first
    Asc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageStatus {
    pub bucket: String,
    pub key: String,
    pub bucket_reachable: bool,
    pub handle_state: crate::cache::HandleState,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub degraded: bool,
}
