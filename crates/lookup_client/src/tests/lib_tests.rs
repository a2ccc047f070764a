use super::*;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde_json::json;
use shared::domain::SelectOption;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct LookupServerState {
    hits: Arc<AtomicUsize>,
}

async fn dependents(
    State(state): State<LookupServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match query.get("parent_id").map(String::as_str) {
        Some("1") => Json(json!([{"id": 1, "name": "A"}, {"id": "2", "name": "B"}])),
        Some("logical") => Json(json!({"error": "city has no townships table"})),
        Some("shape") => Json(json!({"townships": []})),
        _ => Json(json!([])),
    }
}

async fn parent(
    State(state): State<LookupServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match query.get("dependent_id").map(String::as_str) {
        Some("2") => (StatusCode::OK, Json(json!({"id": 1}))),
        Some("orphan") => (StatusCode::OK, Json(json!({"id": null}))),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "township not found"})),
        ),
    }
}

async fn html_page(State(state): State<LookupServerState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Html("<!doctype html><html><body>Page not found</body></html>")
}

async fn broken(State(state): State<LookupServerState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "database unavailable"})),
    )
}

async fn rejected(State(state): State<LookupServerState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::BAD_REQUEST, "bad parent id")
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!([]))
}

async fn spawn_lookup_server() -> (String, LookupServerState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = LookupServerState::default();
    let app = Router::new()
        .route("/lookup-dependents", get(dependents))
        .route("/lookup-parent", get(parent))
        .route("/cases/lookup-dependents", get(dependents))
        .route("/html/lookup-dependents", get(html_page))
        .route("/broken/lookup-dependents", get(broken))
        .route("/rejected/lookup-dependents", get(rejected))
        .route("/slow/lookup-dependents", get(slow))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

async fn unused_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

fn dependents_config(urls: &[String]) -> LookupConfig {
    let mut config = LookupConfig::for_origin(&urls[0]).expect("config");
    config.dependents = urls
        .iter()
        .map(|url| Endpoint::parse(url, config::DEPENDENTS_PARAM).expect("endpoint"))
        .collect();
    config
}

#[tokio::test]
async fn fetches_dependents_in_source_order() {
    let (origin, _) = spawn_lookup_server().await;
    let client =
        HttpLookupClient::new(LookupConfig::for_origin(&origin).expect("config")).expect("client");

    let options = client
        .fetch_dependents(&OptionId::new("1"))
        .await
        .expect("dependents");

    assert_eq!(
        options,
        vec![SelectOption::new("1", "A"), SelectOption::new("2", "B")]
    );
}

#[tokio::test]
async fn empty_ids_short_circuit_without_requests() {
    let (origin, state) = spawn_lookup_server().await;
    let client =
        HttpLookupClient::new(LookupConfig::for_origin(&origin).expect("config")).expect("client");

    assert!(client
        .fetch_dependents(&OptionId::new(""))
        .await
        .expect("dependents")
        .is_empty());
    assert_eq!(
        client.fetch_parent(&OptionId::new(" ")).await.expect("parent"),
        None
    );
    assert_eq!(state.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolves_parent_and_unmapped_dependent() {
    let (origin, _) = spawn_lookup_server().await;
    let client =
        HttpLookupClient::new(LookupConfig::for_origin(&origin).expect("config")).expect("client");

    assert_eq!(
        client.fetch_parent(&OptionId::new("2")).await.expect("parent"),
        Some(OptionId::new("1"))
    );
    assert_eq!(
        client
            .fetch_parent(&OptionId::new("orphan"))
            .await
            .expect("parent"),
        None
    );
}

#[tokio::test]
async fn not_found_uses_json_error_message() {
    let (origin, _) = spawn_lookup_server().await;
    let client =
        HttpLookupClient::new(LookupConfig::for_origin(&origin).expect("config")).expect("client");

    let err = client
        .fetch_parent(&OptionId::new("404"))
        .await
        .expect_err("unknown township");
    assert_eq!(err.kind, LookupFailureKind::NotFound);
    assert_eq!(err.message, "township not found");
    assert!(err.endpoint.as_deref().unwrap_or_default().contains("dependent_id=404"));
}

#[tokio::test]
async fn html_with_success_status_is_malformed() {
    let (origin, _) = spawn_lookup_server().await;
    let client = HttpLookupClient::new(dependents_config(&[format!(
        "{origin}/html/lookup-dependents"
    )]))
    .expect("client");

    let err = client
        .fetch_dependents(&OptionId::new("1"))
        .await
        .expect_err("html page");
    assert_eq!(err.kind, LookupFailureKind::MalformedResponse);
    assert!(err.message.contains("text/html"));
}

#[tokio::test]
async fn classifies_error_payloads_and_statuses() {
    let (origin, _) = spawn_lookup_server().await;
    let cases = [
        (format!("{origin}/lookup-dependents"), "logical", LookupFailureKind::LogicalError),
        (format!("{origin}/lookup-dependents"), "shape", LookupFailureKind::MalformedResponse),
        (format!("{origin}/broken/lookup-dependents"), "1", LookupFailureKind::ServerFailure),
        (format!("{origin}/rejected/lookup-dependents"), "1", LookupFailureKind::BadRequest),
        (format!("{origin}/missing/lookup-dependents"), "1", LookupFailureKind::NotFound),
    ];

    for (url, id, expected) in cases {
        let client = HttpLookupClient::new(dependents_config(&[url.clone()])).expect("client");
        let err = client
            .fetch_dependents(&OptionId::new(id))
            .await
            .expect_err("lookup should fail");
        assert_eq!(err.kind, expected, "url={url} id={id}");
    }

    let client = HttpLookupClient::new(dependents_config(&[format!(
        "{origin}/broken/lookup-dependents"
    )]))
    .expect("client");
    let err = client
        .fetch_dependents(&OptionId::new("1"))
        .await
        .expect_err("server failure");
    assert_eq!(err.message, "database unavailable");
}

#[tokio::test]
async fn connection_refused_is_network_failure() {
    let origin = unused_origin().await;
    let client =
        HttpLookupClient::new(LookupConfig::for_origin(&origin).expect("config")).expect("client");

    let err = client
        .fetch_dependents(&OptionId::new("1"))
        .await
        .expect_err("nothing listening");
    assert_eq!(err.kind, LookupFailureKind::NetworkFailure);
}

#[tokio::test]
async fn timeout_is_network_failure() {
    let (origin, _) = spawn_lookup_server().await;
    let config = dependents_config(&[format!("{origin}/slow/lookup-dependents")])
        .with_timeout(Duration::from_millis(100));
    let client = HttpLookupClient::new(config).expect("client");

    let err = client
        .fetch_dependents(&OptionId::new("1"))
        .await
        .expect_err("timeout");
    assert_eq!(err.kind, LookupFailureKind::NetworkFailure);
    assert_eq!(err.message, "request timed out");
}

#[tokio::test]
async fn falls_back_to_next_candidate_and_stops_at_first_success() {
    let (origin, state) = spawn_lookup_server().await;
    let client = HttpLookupClient::new(dependents_config(&[
        format!("{origin}/missing/lookup-dependents"),
        format!("{origin}/cases/lookup-dependents"),
        format!("{origin}/lookup-dependents"),
    ]))
    .expect("client");

    let options = client
        .fetch_dependents(&OptionId::new("1"))
        .await
        .expect("fallback succeeds");

    assert_eq!(options.len(), 2);
    // The unrouted candidate never reaches a handler; only the second one does.
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_candidates_report_total_failure() {
    let (origin, state) = spawn_lookup_server().await;
    let client = HttpLookupClient::new(dependents_config(&[
        format!("{origin}/html/lookup-dependents"),
        format!("{origin}/broken/lookup-dependents"),
    ]))
    .expect("client");

    let err = client
        .fetch_dependents(&OptionId::new("1"))
        .await
        .expect_err("all candidates fail");

    assert_eq!(err.kind, LookupFailureKind::ServerFailure);
    assert!(err.message.starts_with("all 2 candidate endpoints failed"));
    assert_eq!(state.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cache_buster_does_not_break_lookup() {
    let (origin, _) = spawn_lookup_server().await;
    let config = LookupConfig::for_origin(&origin)
        .expect("config")
        .with_cache_bust(true);
    let client = HttpLookupClient::new(config).expect("client");

    let options = client
        .fetch_dependents(&OptionId::new("1"))
        .await
        .expect("dependents");
    assert_eq!(options.len(), 2);
}

#[test]
fn rejects_config_without_candidates() {
    let mut config = LookupConfig::for_origin("http://localhost:8000").expect("config");
    config.parent.clear();
    assert!(matches!(
        HttpLookupClient::new(config),
        Err(ClientBuildError::Config(ConfigError::NoCandidates("parent")))
    ));
}
