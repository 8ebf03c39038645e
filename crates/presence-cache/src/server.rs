//! HTTP server for presence cache endpoints
//!
//! Provides /list, /clear, /query, /commit and /health.

use crate::types::{parse_names, HealthResponse};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use marker_index::{MarkerIndexError, PresenceCache};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: Arc<PresenceCache>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: Arc<PresenceCache>) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(unmatched))
        .route("/list", get(list).fallback(unmatched))
        .route("/clear", get(clear).fallback(unmatched))
        .route("/query", post(query).fallback(unmatched))
        .route("/commit", post(commit).fallback(unmatched))
        .fallback(unmatched)
        // Name lists scale with the cache capacity
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Unknown path or method: 404 for GET and POST, 403 for anything else
async fn unmatched(method: Method) -> StatusCode {
    if method == Method::GET || method == Method::POST {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::FORBIDDEN
    }
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

/// All known names, one per line
async fn list(State(state): State<SharedState>) -> String {
    let names = state.cache.list().await;
    let mut body = names.join("\n");
    body.push('\n');
    body
}

async fn clear(State(state): State<SharedState>) -> StatusCode {
    state.cache.clear().await;
    StatusCode::OK
}

/// One `1`/`0` per requested name, in request order
async fn query(State(state): State<SharedState>, body: Bytes) -> String {
    let names = parse_names(&String::from_utf8_lossy(&body));
    debug!(names = names.len(), "Query request");

    let mut answer = state.cache.query(&names).await;
    answer.push('\n');
    answer
}

async fn commit(State(state): State<SharedState>, body: Bytes) -> Response {
    let names = parse_names(&String::from_utf8_lossy(&body));
    debug!(names = names.len(), "Commit request");

    match state.cache.commit(&names).await {
        Ok(report) if report.failed.is_empty() => StatusCode::OK.into_response(),
        Ok(report) => {
            warn!(failed = report.failed.len(), "Commit partially failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to commit: {}\n", report.failed.join(",")),
            )
                .into_response()
        }
        Err(MarkerIndexError::InvalidName(name)) => {
            warn!(name = %name, "Rejected commit with invalid name");
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid entry name: {:?}\n", name),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Commit failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
