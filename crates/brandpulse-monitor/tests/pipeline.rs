//! End-to-end tests for `run_monitoring` with the scraping provider and the
//! model provider both served by one `wiremock` server.

use brandpulse_core::{
    AppConfig, CollectionStatus, DatasetIds, Environment, LlmProvider, MonitorRequest, Platform,
    Sentiment,
};
use brandpulse_monitor::{run_monitoring, MonitorError};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_PATH: &str = "/llm/chat/completions";

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "debug".to_owned(),
        scraper_api_key: "test-key".to_owned(),
        scraper_base_url: server.uri(),
        scraper_request_timeout_secs: 5,
        scraper_max_retries: 1,
        scraper_retry_backoff_base_ms: 0,
        scraper_poll_interval_ms: 0,
        scraper_snapshot_timeout_secs: 5,
        dataset_ids: DatasetIds::default(),
        default_mention_limit: 50,
        max_concurrent_requests: 4,
        llm_provider: LlmProvider::Ollama,
        llm_base_url: format!("{}/llm", server.uri()),
        llm_api_key: None,
        llm_model: "deepseek-r1".to_owned(),
        llm_temperature: 0.2,
        llm_request_timeout_secs: 5,
        llm_max_retries: 1,
        llm_retry_backoff_base_ms: 0,
        analysis_max_batch_tokens: 6_000,
        analysis_concurrency: 2,
    }
}

fn request(brand: &str, platforms: &[Platform], limit: Option<u32>) -> MonitorRequest {
    MonitorRequest {
        brand: brand.to_owned(),
        platforms: platforms.to_vec(),
        limit,
    }
}

/// Provider items in each platform's dataset shape.
fn items(platform: Platform, count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|n| match platform {
            Platform::LinkedIn => json!({
                "url": format!("https://www.linkedin.com/posts/acme-{n}"),
                "headline": "Acme update",
                "post_text": format!("LinkedIn post {n} about Acme"),
                "user_id": format!("member{n}")
            }),
            Platform::Instagram => json!({
                "url": format!("https://www.instagram.com/p/acme{n}/"),
                "description": format!("Instagram post {n} about Acme"),
                "user_posted": format!("insta{n}")
            }),
            Platform::X => json!({
                "url": format!("https://x.com/user{n}/status/{n}"),
                "description": format!("X post {n} about Acme"),
                "user_posted": format!("user{n}")
            }),
            Platform::YouTube => json!({
                "url": format!("https://www.youtube.com/watch?v=acme{n}"),
                "title": format!("YouTube video {n} about Acme"),
                "youtuber": format!("@channel{n}")
            }),
        })
        .collect();
    Value::Array(items)
}

/// Mounts trigger, progress, and snapshot endpoints for one platform.
async fn mount_platform(server: &MockServer, platform: Platform, count: usize) {
    let dataset = DatasetIds::default().for_platform(platform).to_owned();
    let snapshot = format!("s_{}", platform.slug());

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .and(query_param("dataset_id", dataset.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": snapshot})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/datasets/v3/progress/{snapshot}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ready"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/datasets/v3/snapshot/{snapshot}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(platform, count)))
        .mount(server)
        .await;
}

/// Makes every trigger for `platform` fail with a 503.
async fn mount_failing_platform(server: &MockServer, platform: Platform) {
    let dataset = DatasetIds::default().for_platform(platform).to_owned();
    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .and(query_param("dataset_id", dataset.as_str()))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

fn completion(sentiment: &str, summary: &str) -> ResponseTemplate {
    let content = json!({
        "sentiment": sentiment,
        "themes": ["product"],
        "notable_mention_ids": [],
        "summary": summary
    });
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
    }))
}

async fn mount_model(server: &MockServer, sentiment: &str, summary: &str) {
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(completion(sentiment, summary))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_platforms_with_ten_mentions_each() {
    let server = MockServer::start().await;
    mount_platform(&server, Platform::LinkedIn, 10).await;
    mount_platform(&server, Platform::YouTube, 10).await;
    mount_model(&server, "positive", "Acme is well received.").await;

    let report = run_monitoring(
        &test_config(&server),
        &request("Acme", &[Platform::LinkedIn, Platform::YouTube], Some(10)),
    )
    .await
    .expect("run should succeed");

    assert_eq!(report.brand, "Acme");
    assert_eq!(report.aggregated.total_mentions, 20);
    assert_eq!(report.aggregated.results.len(), 2);
    for platform in [Platform::LinkedIn, Platform::YouTube] {
        let result = &report.aggregated.results[&platform];
        assert_eq!(result.status(), CollectionStatus::Success);
        assert_eq!(result.mention_count(), 10);
    }
    assert_eq!(report.analysis.sentiment, Sentiment::Positive);
    assert_eq!(report.analysis.analyzed_mentions, 20);
    assert!(!report.analysis.is_degraded());
}

#[tokio::test]
async fn failing_only_platform_yields_empty_analysis() {
    let server = MockServer::start().await;
    mount_failing_platform(&server, Platform::X).await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(completion("positive", "unused"))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_monitoring(&test_config(&server), &request("Acme", &[Platform::X], None))
        .await
        .expect("collection failure must not abort the run");

    let x = &report.aggregated.results[&Platform::X];
    assert_eq!(x.status(), CollectionStatus::Failed);
    assert_eq!(x.mention_count(), 0);
    assert!(x.error().is_some());
    assert_eq!(report.aggregated.total_mentions, 0);
    assert_eq!(report.analysis.sentiment, Sentiment::Unknown);
    assert_eq!(report.analysis.summary, "no data");
}

#[tokio::test]
async fn model_failure_on_one_batch_degrades_analysis() {
    let server = MockServer::start().await;
    mount_platform(&server, Platform::LinkedIn, 1).await;
    mount_platform(&server, Platform::YouTube, 1).await;

    // A one-token cap puts every mention in its own batch.
    let mut config = test_config(&server);
    config.analysis_max_batch_tokens = 1;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_string_contains("] YouTube |"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_model(&server, "neutral", "Only the LinkedIn batch.").await;

    let report = run_monitoring(
        &config,
        &request("Acme", &[Platform::LinkedIn, Platform::YouTube], None),
    )
    .await
    .expect("partial analysis is still a report");

    assert_eq!(report.aggregated.total_mentions, 2);
    assert_eq!(report.analysis.summary, "Only the LinkedIn batch.");
    assert_eq!(report.analysis.analyzed_mentions, 1);
    let degraded = report.analysis.degraded.expect("analysis should be degraded");
    assert_eq!(degraded.failed_batches, 1);
    assert_eq!(degraded.excluded_mentions, 1);
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_brand_is_rejected_without_network_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = run_monitoring(&test_config(&server), &request("   ", &[Platform::X], None))
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::InvalidInput(_)), "got: {err:?}");
}

#[tokio::test]
async fn empty_platform_list_and_bad_limits_are_rejected() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    for req in [
        request("Acme", &[], None),
        request("Acme", &[Platform::X], Some(0)),
        request("Acme", &[Platform::X], Some(501)),
    ] {
        let err = run_monitoring(&config, &req).await.unwrap_err();
        assert!(matches!(err, MonitorError::InvalidInput(_)), "got: {err:?}");
    }
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// ---------------------------------------------------------------------------
// Aggregation properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_platform_does_not_affect_others() {
    let server = MockServer::start().await;
    mount_platform(&server, Platform::LinkedIn, 3).await;
    mount_platform(&server, Platform::Instagram, 4).await;
    mount_failing_platform(&server, Platform::X).await;
    mount_model(&server, "mixed", "Mixed reactions.").await;

    let report = run_monitoring(
        &test_config(&server),
        &request(
            "Acme",
            &[Platform::LinkedIn, Platform::X, Platform::Instagram],
            None,
        ),
    )
    .await
    .unwrap();

    let results = &report.aggregated.results;
    assert_eq!(results[&Platform::X].status(), CollectionStatus::Failed);
    assert_eq!(results[&Platform::LinkedIn].mention_count(), 3);
    assert_eq!(results[&Platform::Instagram].mention_count(), 4);
    let sum: usize = results.values().map(|r| r.mention_count()).sum();
    assert_eq!(report.aggregated.total_mentions, sum);
    assert_eq!(report.aggregated.total_mentions, 7);
    assert_eq!(report.analysis.analyzed_mentions, 7);
}

#[tokio::test]
async fn duplicate_platforms_produce_one_entry_each() {
    let server = MockServer::start().await;
    mount_platform(&server, Platform::X, 2).await;
    mount_platform(&server, Platform::YouTube, 2).await;
    mount_model(&server, "neutral", "Quiet.").await;

    let report = run_monitoring(
        &test_config(&server),
        &request(
            "Acme",
            &[Platform::X, Platform::YouTube, Platform::X],
            None,
        ),
    )
    .await
    .unwrap();

    let platforms: Vec<Platform> = report.aggregated.results.keys().copied().collect();
    assert_eq!(platforms, vec![Platform::X, Platform::YouTube]);

    let triggers = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/datasets/v3/trigger")
        .count();
    assert_eq!(triggers, 2);
}

#[tokio::test]
async fn limit_is_forwarded_and_enforced() {
    let server = MockServer::start().await;
    mount_platform(&server, Platform::X, 8).await;
    mount_model(&server, "neutral", "Quiet.").await;

    let report = run_monitoring(&test_config(&server), &request("Acme", &[Platform::X], Some(5)))
        .await
        .unwrap();
    assert_eq!(report.aggregated.total_mentions, 5);

    let trigger = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .find(|r| r.url.path() == "/datasets/v3/trigger")
        .expect("trigger was called");
    assert!(trigger
        .url
        .query_pairs()
        .any(|(k, v)| k == "limit_per_input" && v == "5"));
}

#[tokio::test]
async fn analysis_outage_returns_collected_data() {
    let server = MockServer::start().await;
    mount_platform(&server, Platform::LinkedIn, 3).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/llm/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = run_monitoring(&test_config(&server), &request("Acme", &[Platform::LinkedIn], None))
        .await
        .unwrap_err();

    let aggregated = err.aggregated().expect("raw data must be returned");
    assert_eq!(aggregated.total_mentions, 3);
    assert!(matches!(err, MonitorError::AnalysisUnavailable { .. }));
}
