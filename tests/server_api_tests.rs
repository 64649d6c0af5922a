use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use royale_stats::data::{BattleDataset, BattleRecord, Card};
use royale_stats::server::app;
use royale_stats::server::routes::route_request;
use royale_stats::stats::BattleStatsEngine;

fn record(winner: &[&str], loser: &[&str], winner_trophies: u32, towers: u32) -> BattleRecord {
    BattleRecord {
        winner_deck: winner.iter().map(|s| s.to_string()).collect(),
        loser_deck: loser.iter().map(|s| s.to_string()).collect(),
        winner_trophies,
        loser_trophies: 5000,
        loser_tower_destroyed: towers,
    }
}

fn test_engine() -> BattleStatsEngine {
    let dataset = BattleDataset::from_records(
        vec![
            record(&["Giant", "Musketeer", "Zap"], &["Hog Rider", "Log"], 5050, 2),
            record(&["Hog Rider", "Log"], &["Giant", "Musketeer", "Zap"], 5000, 0),
            record(&["Giant", "Musketeer", "Zap"], &["Hog Rider", "Log"], 5300, 2),
        ],
        ["Giant", "Musketeer", "Zap", "Hog Rider", "Log"]
            .into_iter()
            .map(Card::named)
            .collect(),
    )
    .expect("dataset should build");
    BattleStatsEngine::new(Arc::new(dataset))
}

fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("response should be valid json")
}

#[test]
fn health_endpoint_returns_ok_json() {
    let response = route_request(&test_engine(), "GET", "/api/health", "");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_type, "application/json");
    assert!(response.body.contains("\"status\": \"ok\""));
}

#[test]
fn index_serves_dashboard_with_all_controls() {
    let response = route_request(&test_engine(), "GET", "/", "");
    assert_eq!(response.status_code, 200);
    assert!(response.content_type.starts_with("text/html"));
    for id in ["card", "threshold", "combo", "trophy-diff", "towers", "combo-size", "combo-threshold"] {
        assert!(response.body.contains(&format!("id=\"{id}\"")), "missing control {id}");
    }
}

#[test]
fn cards_endpoint_lists_catalog_in_order() {
    let response = route_request(&test_engine(), "GET", "/api/cards", "");
    assert_eq!(response.status_code, 200);
    let payload = json_body(&response.body);
    let names: Vec<&str> = payload["cards"]
        .as_array()
        .expect("cards should be an array")
        .iter()
        .filter_map(|card| card["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Giant", "Musketeer", "Zap", "Hog Rider", "Log"]);
}

#[test]
fn summary_endpoint_reports_counts() {
    let response = route_request(&test_engine(), "GET", "/api/data/summary?fresh=1", "");
    assert_eq!(response.status_code, 200);
    let payload = json_body(&response.body);
    assert_eq!(payload["data"]["battle_count"], 3);
    assert_eq!(payload["data"]["distinct_winning_decks"], 2);
    assert!(payload["data"]["loaded_at"].as_str().is_some());
}

#[test]
fn card_win_rate_endpoint_returns_rounded_rates() {
    let response = route_request(
        &test_engine(),
        "POST",
        "/api/card-win-rate",
        r#"{"card":"  Giant "}"#,
    );
    assert_eq!(response.status_code, 200);
    let payload = json_body(&response.body);
    assert_eq!(payload["card"], "Giant");
    assert_eq!(payload["win_rate"], 66.67);
    assert_eq!(payload["loss_rate"], 33.33);
    assert_eq!(payload["battles"], 3);
}

#[test]
fn card_win_rate_endpoint_rejects_blank_card() {
    let response = route_request(&test_engine(), "POST", "/api/card-win-rate", r#"{"card":" "}"#);
    assert_eq!(response.status_code, 400);
    let payload = json_body(&response.body);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["message"], "Validation failed");
    assert_eq!(payload["errors"][0]["field"], "card");
}

#[test]
fn decks_endpoint_uses_default_threshold() {
    let response = route_request(&test_engine(), "POST", "/api/decks", "{}");
    assert_eq!(response.status_code, 200);
    let payload = json_body(&response.body);
    assert_eq!(payload["threshold"], 50.0);
    let decks = payload["decks"].as_array().expect("decks should be an array");
    assert_eq!(decks.len(), 1);
    assert_eq!(decks[0]["deck"], serde_json::json!(["Giant", "Musketeer", "Zap"]));
    assert_eq!(decks[0]["occurrences"], 2);
}

#[test]
fn decks_endpoint_rejects_out_of_range_threshold() {
    let response = route_request(&test_engine(), "POST", "/api/decks", r#"{"threshold":150}"#);
    assert_eq!(response.status_code, 400);
    let payload = json_body(&response.body);
    assert_eq!(payload["errors"][0]["field"], "threshold");
}

#[test]
fn combo_losses_endpoint_parses_free_text() {
    let response = route_request(
        &test_engine(),
        "POST",
        "/api/combo-losses",
        r#"{"combo":" Giant , Musketeer ,"}"#,
    );
    assert_eq!(response.status_code, 200);
    let payload = json_body(&response.body);
    assert_eq!(payload["combo"], serde_json::json!(["Giant", "Musketeer"]));
    assert_eq!(payload["losses"], 1);
}

#[test]
fn combo_losses_endpoint_rejects_empty_combo() {
    let response = route_request(&test_engine(), "POST", "/api/combo-losses", r#"{"combo":" , "}"#);
    assert_eq!(response.status_code, 400);
    let payload = json_body(&response.body);
    assert_eq!(payload["errors"][0]["field"], "combo");
}

#[test]
fn conditional_wins_endpoint_applies_defaults() {
    // defaults: trophy_difference 100, tower_destroyed 2
    let response = route_request(
        &test_engine(),
        "POST",
        "/api/conditional-wins",
        r#"{"card":"Giant"}"#,
    );
    assert_eq!(response.status_code, 200);
    let payload = json_body(&response.body);
    assert_eq!(payload["trophy_difference"], 100);
    assert_eq!(payload["tower_destroyed"], 2);
    assert_eq!(payload["wins"], 1);

    let response = route_request(
        &test_engine(),
        "POST",
        "/api/conditional-wins",
        r#"{"card":"Giant","trophy_difference":300,"tower_destroyed":0}"#,
    );
    assert_eq!(json_body(&response.body)["wins"], 2);
}

#[test]
fn combo_wins_endpoint_is_deterministic_for_fixed_seed() {
    let body = r#"{"deck_size":2,"win_rate_threshold":10,"seed":7}"#;
    let engine = test_engine();
    let a = route_request(&engine, "POST", "/api/combo-wins", body);
    let b = route_request(&engine, "POST", "/api/combo-wins", body);
    assert_eq!(a.status_code, 200);
    assert_eq!(a.body, b.body);

    let payload = json_body(&a.body);
    let combos = payload["combos"].as_array().expect("combos should be an array");
    assert!(combos.len() <= 10);
    for combo in combos {
        assert_eq!(combo["combo"].as_array().map(Vec::len), Some(2));
        let rate = combo["win_rate"].as_f64().expect("win_rate should be a number");
        assert!(rate > 10.0 && rate <= 100.0);
    }
}

#[test]
fn combo_wins_endpoint_validates_sliders() {
    let response = route_request(
        &test_engine(),
        "POST",
        "/api/combo-wins",
        r#"{"deck_size":0,"win_rate_threshold":-5}"#,
    );
    assert_eq!(response.status_code, 400);
    let payload = json_body(&response.body);
    let fields: Vec<&str> = payload["errors"]
        .as_array()
        .expect("errors should be array")
        .iter()
        .filter_map(|error| error["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["deck_size", "win_rate_threshold"]);
}

#[test]
fn combo_wins_endpoint_rejects_combo_larger_than_pool() {
    // only Giant, Musketeer, Zap, Hog Rider and Log ever won
    let response = route_request(
        &test_engine(),
        "POST",
        "/api/combo-wins",
        r#"{"deck_size":6,"seed":1}"#,
    );
    assert_eq!(response.status_code, 400);
    assert!(response.body.contains("pool of 5"));
}

#[test]
fn invalid_json_is_a_bad_request() {
    let response = route_request(&test_engine(), "POST", "/api/decks", "{bad json}");
    assert_eq!(response.status_code, 400);
    assert!(response.body.contains("Invalid request body"));
}

#[test]
fn unknown_route_is_not_found() {
    let response = route_request(&test_engine(), "GET", "/api/optimize", "");
    assert_eq!(response.status_code, 404);
    let response = route_request(&test_engine(), "GET", "/api/decks", "");
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn axum_app_forwards_to_router() {
    let app = app(Arc::new(test_engine()));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/combo-losses")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"combo":"Hog Rider"}"#))
                .expect("request should build"),
        )
        .await
        .expect("router is infallible");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(payload["losses"], 2);
}

#[tokio::test]
async fn axum_app_maps_not_found() {
    let app = app(Arc::new(test_engine()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router is infallible");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer lock")).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn axum_app_warns_on_client_errors() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let ok = app(Arc::new(test_engine()))
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router is infallible");
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(!logs.contents().contains("request failed"));

    let bad = app(Arc::new(test_engine()))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/decks")
                .body(Body::from(r#"{"threshold":150}"#))
                .expect("request should build"),
        )
        .await
        .expect("router is infallible");
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let missing = app(Arc::new(test_engine()))
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router is infallible");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let captured = logs.contents();
    assert!(captured.contains("request failed"), "{captured}");
    assert!(captured.contains("status=400"), "{captured}");
    assert!(captured.contains("status=404"), "{captured}");
}
