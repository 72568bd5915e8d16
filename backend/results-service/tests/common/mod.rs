//! Shared fixtures: a compiled results file built with rusqlite and uploaded to an
//! in-memory object store

#![allow(dead_code)]

use results_service::{DataAccessService, DataSource, FreshnessPolicy};
use rusqlite::{params, Connection};
use s3_utils::InMemoryObjectStore;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const BUCKET: &str = "lottery";
pub const KEY: &str = "lottery_results.db";

/// `(game_name, draw_number, draw_date, winning_numbers)`
pub type Draw = (&'static str, i64, &'static str, &'static [&'static str]);

pub fn build_results_file(path: &Path, draws: &[Draw]) -> Vec<u8> {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE lottery_results (
            game_name TEXT NOT NULL,
            draw_number INTEGER NOT NULL,
            draw_date DATE NOT NULL,
            file_path TEXT,
            winning_numbers TEXT,
            prize_tiers TEXT,
            PRIMARY KEY (game_name, draw_number)
        );",
    )
    .unwrap();

    for (game, number, date, numbers) in draws {
        conn.execute(
            "INSERT INTO lottery_results VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                game,
                number,
                date,
                format!("{game}/{number}.json"),
                serde_json::to_string(numbers).unwrap(),
                r#"[{"tier":1,"description":"Sena","winners":0,"prize":0.0}]"#,
            ],
        )
        .unwrap();
    }
    drop(conn);

    std::fs::read(path).unwrap()
}

pub fn draw(
    game: &'static str,
    number: i64,
    date: &'static str,
    numbers: &'static [&'static str],
) -> Draw {
    (game, number, date, numbers)
}

/// Megasena draws 90..=97 and 100..=101, one draw each of quina, lotofacil and a game
/// outside the catalog
pub fn sample_draws() -> Vec<Draw> {
    let mut draws = vec![
        draw("megasena", 100, "2024-01-02", &["04", "08", "15", "16", "23", "42"]),
        draw("megasena", 101, "2024-01-05", &["01", "08", "19", "23", "37", "60"]),
        draw("quina", 6400, "2024-03-20", &["05", "11", "23", "42", "77"]),
        draw(
            "lotofacil",
            3050,
            "2024-03-21",
            &["01", "02", "03", "05", "08", "10", "11", "13", "14", "17", "18", "20", "22", "24", "25"],
        ),
        draw("timemania", 2050, "2024-03-21", &["01", "02", "03", "04", "05", "06", "07"]),
    ];
    let dates = [
        "2023-06-01", "2023-06-03", "2023-06-06", "2023-06-08", "2023-06-10", "2023-06-13",
        "2023-06-15", "2023-06-17",
    ];
    for (i, date) in dates.into_iter().enumerate() {
        draws.push(draw("megasena", 90 + i as i64, date, &["10", "20", "30", "40", "50", "60"]));
    }
    draws
}

pub struct Fixture {
    pub store: Arc<InMemoryObjectStore>,
    pub service: Arc<DataAccessService>,
    pub dir: TempDir,
}

impl Fixture {
    pub fn new(draws: &[Draw], policy: FreshnessPolicy) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let body = build_results_file(&dir.path().join("source.db"), draws);

        let store = Arc::new(InMemoryObjectStore::new());
        store.insert(BUCKET, KEY, body);

        let source = DataSource {
            bucket: BUCKET.to_string(),
            key: KEY.to_string(),
            local_path: dir.path().join("cache").join(KEY),
        };
        let service = Arc::new(DataAccessService::new(store.clone(), source, policy));

        Self { store, service, dir }
    }

    pub fn sample() -> Self {
        Self::new(&sample_draws(), FreshnessPolicy::default())
    }

    /// Replace the remote file with a new build
    pub fn publish(&self, draws: &[Draw]) {
        let path = self
            .dir
            .path()
            .join(format!("source-{}.db", uuid::Uuid::new_v4()));
        let body = build_results_file(&path, draws);
        self.store.insert(BUCKET, KEY, body);
    }
}
