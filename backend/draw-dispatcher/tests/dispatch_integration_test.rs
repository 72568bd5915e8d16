/// End-to-end dispatch against a stubbed orchestrator API
use draw_dispatcher::{
    BatchDispatcher, BatchPolicy, Config, DrawRange, OrchestratorClient, TriggerError,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const WORKFLOW: &str = "fetch-lottery-results";

fn config_for(server: &MockServer) -> Config {
    Config {
        batch_size: 3,
        wait_seconds: 0.0,
        orchestrator_api_url: server.uri(),
        workflow: WORKFLOW.to_string(),
        api_key: None,
        request_timeout_secs: 5,
    }
}

fn posted_draws(requests: &[Request]) -> Vec<u64> {
    requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["draw_number"].as_u64().unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_backfill_range_reaches_orchestrator_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deployments/fetch-lottery-results/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "r" })))
        .expect(8)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = OrchestratorClient::new(&config).unwrap();
    let policy = BatchPolicy::from_config(&config).unwrap();
    let dispatcher = BatchDispatcher::new(Arc::new(client), policy, WORKFLOW);

    let report = dispatcher.run(DrawRange::new(2700, 2707).unwrap()).await.unwrap();

    assert_eq!(report.triggered, (2700..=2707).collect::<Vec<_>>());
    assert!(report.failures.is_empty());
    assert_eq!(report.pauses, 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(posted_draws(&requests), (2700..=2707).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_rejected_draw_is_reported_and_rest_continue() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({ "draw_number": 5 })))
        .respond_with(ResponseTemplate::new(500).set_body_string("invalid draw"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .with_priority(2)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = OrchestratorClient::new(&config).unwrap();
    let dispatcher = BatchDispatcher::new(
        Arc::new(client),
        BatchPolicy::new(3, Duration::ZERO).unwrap(),
        WORKFLOW,
    );

    let report = dispatcher.run(DrawRange::new(1, 10).unwrap()).await.unwrap();

    assert_eq!(report.total_issued(), 10);
    assert_eq!(report.failed_draws(), vec![5]);
    assert_eq!(
        report.failures[0].error,
        TriggerError::Rejected {
            status: 500,
            body: "invalid draw".to_string()
        }
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(posted_draws(&requests), (1..=10).collect::<Vec<u64>>());
}
