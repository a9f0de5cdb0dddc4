// Behavior tests for `PresenceService` using wiremock.
//
// wiremock's `expect(n)` doubles as the network-call counter: callers
// that must not hit the network get an `expect(0)` mock, and cache
// behavior is pinned by exact request counts. TTL expiry is exercised
// with an interval of "0" (every entry immediately stale) instead of
// wall-clock sleeps.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hapresence_core::{
    MemoryConfig, PresenceError, PresenceService, ProbeOverrides, keys,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer, ttl: &str) -> Arc<MemoryConfig> {
    Arc::new(MemoryConfig::from_pairs([
        (keys::HA_URL, server.uri().as_str()),
        (keys::HA_TOKEN, "llt-token"),
        (keys::HA_POLLING_INTERVAL, ttl),
        (keys::HA_ALLOW_LOCAL, "1"),
    ]))
}

fn states_body() -> serde_json::Value {
    json!([
        {
            "entity_id": "person.alice",
            "state": "home",
            "last_changed": "2024-01-01T00:00:00Z",
            "attributes": { "friendly_name": "Alice" }
        },
        { "entity_id": "sensor.temp", "state": "21" },
        { "entity_id": "person.bob", "attributes": {} },
    ])
}

async fn mount_states(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(states_body()))
        .expect(expected)
        .mount(server)
        .await;
}

// ── Configuration short-circuit ─────────────────────────────────────

#[tokio::test]
async fn test_missing_url_fails_without_network_call() {
    let server = MockServer::start().await;
    mount_states(&server, 0).await;

    let config = Arc::new(MemoryConfig::from_pairs([(keys::HA_TOKEN, "llt-token")]));
    let service = PresenceService::new(config);

    assert_eq!(
        service.person_presence().await,
        Err(PresenceError::NotConfigured)
    );
}

#[tokio::test]
async fn test_missing_token_fails_without_network_call() {
    let server = MockServer::start().await;
    mount_states(&server, 0).await;

    let config = Arc::new(MemoryConfig::from_pairs([
        (keys::HA_URL, server.uri().as_str()),
        (keys::HA_ALLOW_LOCAL, "1"),
    ]));
    let service = PresenceService::new(config);

    assert_eq!(
        service.person_presence().await,
        Err(PresenceError::NotConfigured)
    );
}

// ── Filtering and field defaults ────────────────────────────────────

#[tokio::test]
async fn test_only_person_entities_survive_in_upstream_order() {
    let server = MockServer::start().await;
    mount_states(&server, 1).await;

    let service = PresenceService::new(config_for(&server, "300"));
    let records = service.person_presence().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].entity_id, "person.alice");
    assert_eq!(records[0].name, "Alice");
    assert_eq!(records[0].state, "home");
    assert_eq!(records[0].last_changed.as_deref(), Some("2024-01-01T00:00:00Z"));
    assert_eq!(records[1].entity_id, "person.bob");
}

#[tokio::test]
async fn test_missing_fields_get_documented_defaults() {
    let server = MockServer::start().await;
    mount_states(&server, 1).await;

    let service = PresenceService::new(config_for(&server, "300"));
    let records = service.person_presence().await.unwrap();

    let bob = &records[1];
    assert_eq!(bob.name, "person.bob");
    assert_eq!(bob.state, "unknown");
    assert_eq!(bob.last_changed, None);
}

// ── Cache behavior ──────────────────────────────────────────────────

#[tokio::test]
async fn test_calls_within_ttl_share_one_fetch() {
    let server = MockServer::start().await;
    mount_states(&server, 1).await;

    let service = PresenceService::new(config_for(&server, "300"));

    let first = service.person_presence().await.unwrap();
    let second = service.person_presence().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expired_ttl_triggers_a_fresh_fetch() {
    let server = MockServer::start().await;
    mount_states(&server, 2).await;

    // TTL of zero: every cached entry is immediately stale.
    let service = PresenceService::new(config_for(&server, "0"));

    service.person_presence().await.unwrap();
    service.person_presence().await.unwrap();
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    // Long TTL: only the absence of a cached failure explains a retry.
    let service = PresenceService::new(config_for(&server, "300"));

    let first = service.person_presence().await.unwrap_err();
    assert_eq!(first, PresenceError::Upstream { status: 503 });
    assert!(first.to_string().contains("503"));

    let second = service.person_presence().await.unwrap_err();
    assert_eq!(second, PresenceError::Upstream { status: 503 });
}

#[tokio::test]
async fn test_invalid_body_is_a_structured_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let service = PresenceService::new(config_for(&server, "300"));
    assert_eq!(
        service.person_presence().await,
        Err(PresenceError::InvalidResponse)
    );
}

// ── Prober ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_never_touches_the_presence_cache() {
    let server = MockServer::start().await;
    mount_states(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "API running." })))
        .expect(2)
        .mount(&server)
        .await;

    let service = PresenceService::new(config_for(&server, "300"));

    // Interleave: probe, fetch, probe, fetch. The states endpoint must
    // be hit exactly once and the liveness endpoint exactly twice.
    let probe = service.test_connection(ProbeOverrides::default()).await;
    assert!(probe.success);
    assert_eq!(probe.message, "Successfully connected to Home Assistant");

    service.person_presence().await.unwrap();
    service.test_connection(ProbeOverrides::default()).await;
    service.person_presence().await.unwrap();
}

#[tokio::test]
async fn test_probe_reports_upstream_status_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = PresenceService::new(config_for(&server, "300"));
    let probe = service.test_connection(ProbeOverrides::default()).await;

    assert!(!probe.success);
    assert_eq!(probe.message, "Failed to connect: HTTP 503");
}

#[tokio::test]
async fn test_probe_with_nothing_configured() {
    let service = PresenceService::new(Arc::new(MemoryConfig::new()));

    let probe = service
        .test_connection(ProbeOverrides {
            url: Some(String::new()),
            token: Some(String::new()),
            ..ProbeOverrides::default()
        })
        .await;

    assert!(!probe.success);
    assert_eq!(probe.message, "Home Assistant URL and token must be configured");
}

#[tokio::test]
async fn test_probe_overrides_beat_stored_config() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "API running." })))
        .expect(1)
        .mount(&server)
        .await;

    // Store points at a dead URL; overrides point at the live server.
    let config = Arc::new(MemoryConfig::from_pairs([
        (keys::HA_URL, "http://stored.invalid:8123"),
        (keys::HA_TOKEN, "stored"),
        (keys::HA_ALLOW_LOCAL, "1"),
    ]));
    let service = PresenceService::new(config);

    let probe = service
        .test_connection(ProbeOverrides {
            url: Some(server.uri()),
            token: Some("override-token".into()),
            timeout_secs: Some(5),
            verify_ssl: Some(true),
        })
        .await;

    assert!(probe.success, "unexpected failure: {}", probe.message);
}

// ── Local-destination policy ────────────────────────────────────────

#[tokio::test]
async fn test_local_block_message_is_actionable_and_leak_free() {
    let config = Arc::new(MemoryConfig::from_pairs([
        (keys::HA_URL, "http://192.168.1.20:8123"),
        (keys::HA_TOKEN, "llt-token"),
        // ha_allow_local left at its default of "0"
    ]));
    let service = PresenceService::new(config);

    let err = service.person_presence().await.unwrap_err();
    assert_eq!(err, PresenceError::LocalDestinationBlocked);

    let message = err.to_string();
    assert_ne!(message, PresenceError::ConnectionFailed.to_string());
    assert!(message.contains("ha_allow_local"));
    for leak in ["reqwest", "hyper", "Error::", "panicked"] {
        assert!(!message.contains(leak), "message leaks '{leak}': {message}");
    }

    let probe = service.test_connection(ProbeOverrides::default()).await;
    assert!(!probe.success);
    assert_eq!(probe.message, message);
}

#[tokio::test]
async fn test_unreachable_host_is_a_generic_connection_failure() {
    // RFC 2606 reserved TLD: DNS resolution fails fast.
    let config = Arc::new(MemoryConfig::from_pairs([
        (keys::HA_URL, "http://ha.invalid:8123"),
        (keys::HA_TOKEN, "llt-token"),
        (keys::HA_CONNECTION_TIMEOUT, "5"),
    ]));
    let service = PresenceService::new(config);

    let err = service.person_presence().await.unwrap_err();
    assert_eq!(err, PresenceError::ConnectionFailed);
    assert_eq!(
        err.to_string(),
        "Could not connect to Home Assistant. Please check your settings."
    );
}
