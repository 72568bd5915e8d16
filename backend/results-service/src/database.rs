//! Read-only queries over the compiled results file
//!
//! Every function takes an open connection and runs synchronously; callers are
//! expected to be on a blocking thread.

use crate::error::{Result, ServiceError};
use crate::games;
use crate::models::{FrequencyOrder, GameSummary, NumberFrequency, ResultRow};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags, Params};
use std::collections::BTreeMap;
use std::path::Path;

const RESULT_COLUMNS: &str =
    "game_name, draw_number, draw_date, file_path, winning_numbers, prize_tiers";

/// Open the local copy without write access; a replaced file does not affect an open connection
pub fn open_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// Column values exactly as stored, before JSON and date decoding
struct RawRow {
    game_name: String,
    draw_number: i64,
    draw_date: String,
    file_path: Option<String>,
    winning_numbers: Option<String>,
    prize_tiers: Option<String>,
}

impl RawRow {
    fn decode(self) -> Result<ResultRow> {
        let date_text = self.draw_date.get(..10).unwrap_or(&self.draw_date);
        let draw_date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|e| {
            ServiceError::QueryError(format!(
                "invalid draw_date '{}' for {} #{}: {}",
                self.draw_date, self.game_name, self.draw_number, e
            ))
        })?;

        let winning_numbers = match self.winning_numbers.as_deref() {
            None | Some("") => Vec::new(),
            Some(text) => decode_numbers(text).map_err(|e| {
                ServiceError::QueryError(format!(
                    "invalid winning_numbers for {} #{}: {}",
                    self.game_name, self.draw_number, e
                ))
            })?,
        };

        let prize_tiers = match self.prize_tiers.as_deref() {
            None | Some("") => serde_json::Value::Null,
            Some(text) => serde_json::from_str(text).map_err(|e| {
                ServiceError::QueryError(format!(
                    "invalid prize_tiers for {} #{}: {}",
                    self.game_name, self.draw_number, e
                ))
            })?,
        };

        Ok(ResultRow {
            game_name: self.game_name,
            draw_number: self.draw_number,
            draw_date,
            file_path: self.file_path.unwrap_or_default(),
            winning_numbers,
            prize_tiers,
        })
    }
}

/// Winning numbers are stored as a JSON array of zero-padded strings; bare integers
/// are padded the same way
fn decode_numbers(text: &str) -> std::result::Result<Vec<String>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    Ok(values
        .into_iter()
        .map(|value| match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(n) => format!("{n:02}"),
                None => n.to_string(),
            },
            other => other.to_string(),
        })
        .collect())
}

fn fetch_rows<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<ResultRow>> {
    let mut stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
        return Err(ServiceError::QueryError(
            "only read-only statements are allowed".to_string(),
        ));
    }

    let raw = stmt
        .query_map(params, |row| {
            Ok(RawRow {
                game_name: row.get("game_name")?,
                draw_number: row.get("draw_number")?,
                draw_date: row.get("draw_date")?,
                file_path: row.get("file_path")?,
                winning_numbers: row.get("winning_numbers")?,
                prize_tiers: row.get("prize_tiers")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    raw.into_iter().map(RawRow::decode).collect()
}

/// Run an arbitrary statement; it must be a single read-only statement returning the
/// `lottery_results` columns
pub fn query(conn: &Connection, statement: &str) -> Result<Vec<ResultRow>> {
    fetch_rows(conn, statement, [])
}

pub fn latest_results(conn: &Connection, game_name: &str, limit: u32) -> Result<Vec<ResultRow>> {
    let sql = format!(
        "SELECT {RESULT_COLUMNS} FROM lottery_results \
         WHERE game_name = ?1 ORDER BY draw_number DESC LIMIT ?2"
    );
    fetch_rows(conn, &sql, params![game_name, limit])
}

/// Most recent draw of every target game, in catalog order
pub fn latest_per_game(conn: &Connection) -> Result<Vec<ResultRow>> {
    let sql = format!(
        "SELECT {RESULT_COLUMNS} FROM lottery_results r \
         WHERE r.draw_number = ( \
             SELECT MAX(l.draw_number) FROM lottery_results l WHERE l.game_name = r.game_name \
         )"
    );
    let mut rows: Vec<ResultRow> = fetch_rows(conn, &sql, [])?
        .into_iter()
        .filter(|row| games::is_target_game(&row.game_name))
        .collect();
    rows.sort_by_key(|row| games::catalog_position(&row.game_name));
    Ok(rows)
}

/// Target games that have at least one draw in the file, in catalog order
pub fn available_games(conn: &Connection) -> Result<Vec<GameSummary>> {
    let mut stmt = conn.prepare("SELECT DISTINCT game_name FROM lottery_results")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut present: Vec<(usize, GameSummary)> = names
        .iter()
        .filter_map(|name| {
            let position = games::catalog_position(name)?;
            let display_name = games::display_name(name)?;
            Some((
                position,
                GameSummary {
                    name: name.clone(),
                    display_name: display_name.to_string(),
                },
            ))
        })
        .collect();
    present.sort_by_key(|(position, _)| *position);

    Ok(present.into_iter().map(|(_, game)| game).collect())
}

pub fn draw_by_number(
    conn: &Connection,
    game_name: &str,
    draw_number: i64,
) -> Result<Option<ResultRow>> {
    let sql = format!(
        "SELECT {RESULT_COLUMNS} FROM lottery_results \
         WHERE game_name = ?1 AND draw_number = ?2"
    );
    Ok(fetch_rows(conn, &sql, params![game_name, draw_number])?
        .into_iter()
        .next())
}

/// How often each winning number was drawn for `game_name`. Ties are broken by the
/// smaller number first; entries that are not numbers are skipped.
pub fn number_frequency(
    conn: &Connection,
    game_name: &str,
    limit: Option<u32>,
    order: FrequencyOrder,
) -> Result<Vec<NumberFrequency>> {
    let mut stmt =
        conn.prepare("SELECT winning_numbers FROM lottery_results WHERE game_name = ?1")?;
    let stored = stmt
        .query_map([game_name], |row| row.get::<_, Option<String>>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
    for text in stored.iter().flatten() {
        let numbers = decode_numbers(text).map_err(|e| {
            ServiceError::QueryError(format!("invalid winning_numbers for {game_name}: {e}"))
        })?;
        for number in numbers.iter().filter_map(|n| n.trim().parse::<u32>().ok()) {
            *counts.entry(number).or_insert(0) += 1;
        }
    }

    let mut frequencies: Vec<NumberFrequency> = counts
        .into_iter()
        .map(|(number, frequency)| NumberFrequency { number, frequency })
        .collect();

    // BTreeMap iteration already yields numbers ascending; a stable sort keeps that for ties
    match order {
        FrequencyOrder::Desc => frequencies.sort_by(|a, b| b.frequency.cmp(&a.frequency)),
        FrequencyOrder::Asc => frequencies.sort_by(|a, b| a.frequency.cmp(&b.frequency)),
    }

    if let Some(limit) = limit {
        frequencies.truncate(limit as usize);
    }
    Ok(frequencies)
}
