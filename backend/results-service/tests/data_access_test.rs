/// Data access against a compiled results file served from an in-memory object store
mod common;

use common::{draw, Fixture, BUCKET, KEY};
use results_service::{FreshnessPolicy, FrequencyOrder, HandleState, ServiceError};
use std::time::Duration;

#[tokio::test]
async fn test_latest_result_is_highest_draw_number() {
    let fixture = Fixture::new(
        &[
            draw("megasena", 100, "2024-01-02", &["04", "08", "15", "16", "23", "42"]),
            draw("megasena", 101, "2024-01-05", &["01", "08", "19", "23", "37", "60"]),
        ],
        FreshnessPolicy::default(),
    );

    let rows = fixture.service.latest_results("megasena", 1).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].draw_number, 101);
    assert_eq!(rows[0].winning_numbers, vec!["01", "08", "19", "23", "37", "60"]);
}

#[tokio::test]
async fn test_latest_results_are_bounded_and_strictly_descending() {
    let fixture = Fixture::sample();

    let rows = fixture.service.latest_results("megasena", 5).await.unwrap();

    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.game_name == "megasena"));
    assert!(rows.windows(2).all(|w| w[0].draw_number > w[1].draw_number));
    assert_eq!(rows[0].draw_number, 101);
}

#[tokio::test]
async fn test_repeated_reads_within_threshold_fetch_once() {
    let fixture = Fixture::sample();

    fixture.service.latest_results("megasena", 5).await.unwrap();
    fixture.service.latest_per_game().await.unwrap();
    fixture.service.available_games().await.unwrap();
    fixture.service.draw("quina", 6400).await.unwrap();

    assert_eq!(fixture.store.get_calls(), 1);
}

#[tokio::test]
async fn test_concurrent_reads_download_once() {
    let fixture = Fixture::sample();
    fixture.store.set_latency(Duration::from_millis(50));

    let reads = (0..6).map(|_| fixture.service.latest_results("quina", 5));
    let results = futures::future::join_all(reads).await;

    assert!(results.iter().all(|r| r.as_ref().map(|rows| rows.len() == 1).unwrap_or(false)));
    assert_eq!(fixture.store.get_calls(), 1);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_any_fetch() {
    let fixture = Fixture::sample();

    assert!(matches!(
        fixture.service.latest_results("megasena", 0).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        fixture.service.latest_results("powerball", 5).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert_eq!(fixture.store.get_calls(), 0);
}

#[tokio::test]
async fn test_limit_above_maximum_is_clamped() {
    let draws: Vec<_> = (1..=60)
        .map(|n| draw("quina", n, "2024-01-01", &["01", "02", "03", "04", "05"]))
        .collect();
    let fixture = Fixture::new(&draws, FreshnessPolicy::default());

    let rows = fixture.service.latest_results("quina", 1000).await.unwrap();

    assert_eq!(rows.len(), 50);
    assert_eq!(rows[0].draw_number, 60);
}

#[tokio::test]
async fn test_write_statement_is_rejected_and_file_untouched() {
    let fixture = Fixture::sample();
    let handle = fixture.service.data_file().await.unwrap();

    let err = fixture
        .service
        .query(&handle, "DELETE FROM lottery_results WHERE game_name = 'megasena'")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::QueryError(_)));

    let err = fixture
        .service
        .query(&handle, "DROP TABLE lottery_results")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::QueryError(_)));

    let rows = fixture.service.latest_results("megasena", 50).await.unwrap();
    assert_eq!(rows.len(), 10);
}

#[tokio::test]
async fn test_arbitrary_read_query() {
    let fixture = Fixture::sample();
    let handle = fixture.service.data_file().await.unwrap();

    let rows = fixture
        .service
        .query(
            &handle,
            "SELECT * FROM lottery_results WHERE draw_date >= '2024-01-01' ORDER BY draw_number",
        )
        .await
        .unwrap();

    let numbers: Vec<i64> = rows.iter().map(|r| r.draw_number).collect();
    assert_eq!(numbers, vec![100, 101, 2050, 3050, 6400]);
}

#[tokio::test]
async fn test_latest_per_game_and_available_games() {
    let fixture = Fixture::sample();

    let latest = fixture.service.latest_per_game().await.unwrap();
    let summary: Vec<(&str, i64)> = latest
        .iter()
        .map(|r| (r.game_name.as_str(), r.draw_number))
        .collect();
    assert_eq!(
        summary,
        vec![("lotofacil", 3050), ("quina", 6400), ("megasena", 101)]
    );

    let games = fixture.service.available_games().await.unwrap();
    let display: Vec<&str> = games.iter().map(|g| g.display_name.as_str()).collect();
    assert_eq!(display, vec!["Lotofácil", "Quina", "Mega-Sena"]);
}

#[tokio::test]
async fn test_number_frequency_over_megasena() {
    let fixture = Fixture::sample();

    let top = fixture
        .service
        .number_frequency("megasena", Some(2), FrequencyOrder::Desc)
        .await
        .unwrap();

    // 10/20/30/40/50 appear in the eight older draws, 60 in those plus draw 101
    assert_eq!(top[0].number, 60);
    assert_eq!(top[0].frequency, 9);
    assert_eq!(top[1].number, 10);
    assert_eq!(top[1].frequency, 8);
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let fixture = Fixture::sample();
    let path = fixture.dir.path().join("missing.db");

    let err = fixture
        .service
        .ensure_local_copy(BUCKET, "missing.db", &path)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::ObjectNotFound { .. }));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_outage_serves_last_local_copy() {
    let fixture = Fixture::new(&common::sample_draws(), FreshnessPolicy::Always);

    fixture.service.latest_results("megasena", 5).await.unwrap();
    fixture.store.set_unavailable(true);

    let rows = fixture.service.latest_results("megasena", 1).await.unwrap();
    assert_eq!(rows[0].draw_number, 101);

    let status = fixture.service.storage_status().await;
    assert!(status.degraded);
    assert!(!status.bucket_reachable);
}

#[tokio::test]
async fn test_invalidation_during_outage_resyncs_after_recovery() {
    let fixture = Fixture::sample();
    fixture.service.latest_results("megasena", 1).await.unwrap();

    let mut draws = common::sample_draws();
    draws.push(draw("megasena", 102, "2024-01-09", &["02", "09", "14", "33", "41", "58"]));
    fixture.publish(&draws);
    fixture.service.invalidate();
    fixture.store.set_unavailable(true);

    let handle = fixture.service.data_file().await.unwrap();
    assert!(handle.degraded);

    fixture.store.set_unavailable(false);
    let gets_before = fixture.store.get_calls();

    let handle = fixture.service.data_file().await.unwrap();
    assert!(!handle.degraded);
    assert_eq!(fixture.store.get_calls(), gets_before + 1);

    let rows = fixture.service.latest_results("megasena", 1).await.unwrap();
    assert_eq!(rows[0].draw_number, 102);

    let status = fixture.service.storage_status().await;
    assert_eq!(status.handle_state, HandleState::Fresh);
    assert!(!status.degraded);
}

#[tokio::test]
async fn test_outage_without_local_copy_is_unavailable() {
    let fixture = Fixture::sample();
    fixture.store.set_unavailable(true);

    let err = fixture.service.latest_results("megasena", 5).await.unwrap_err();
    assert!(matches!(err, ServiceError::StorageUnavailable(_)));
}

#[tokio::test]
async fn test_invalidate_picks_up_new_publication() {
    let fixture = Fixture::sample();
    fixture.service.latest_results("megasena", 1).await.unwrap();

    let mut draws = common::sample_draws();
    draws.push(draw("megasena", 102, "2024-01-09", &["02", "09", "14", "33", "41", "58"]));
    fixture.publish(&draws);

    // Still fresh: the old copy keeps being served
    let rows = fixture.service.latest_results("megasena", 1).await.unwrap();
    assert_eq!(rows[0].draw_number, 101);

    fixture.service.invalidate();
    let rows = fixture.service.latest_results("megasena", 1).await.unwrap();
    assert_eq!(rows[0].draw_number, 102);
    assert_eq!(fixture.store.get_calls(), 2);

    let status = fixture.service.storage_status().await;
    assert_eq!(status.handle_state, HandleState::Fresh);
    assert_eq!(status.key, KEY);
}
