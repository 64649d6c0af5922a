use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::stats::BattleStatsEngine;

pub mod api;
pub mod routes;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Every request goes through [`routes::route_request`]; axum only carries bytes.
pub fn app(engine: Arc<BattleStatsEngine>) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(engine)
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(
    State(engine): State<Arc<BattleStatsEngine>>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let response = routes::route_request(&engine, method.as_str(), path, &body);
    if response.status_code >= 400 {
        warn!(%method, path, status = response.status_code, "request failed");
    }
    response.into_response()
}

pub fn run_server(bind_addr: &str, engine: Arc<BattleStatsEngine>) -> std::io::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(bind_addr, engine))
}

async fn serve(bind_addr: &str, engine: Arc<BattleStatsEngine>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("royale-stats dashboard listening on http://{bind_addr}");
    axum::serve(listener, app(engine)).await
}
