//! HTTP API.
//!
//! Every route except `/health` lives under `/api` and needs a session.
//! Responses use the `{ "success": true, ... }` envelope; errors are
//! rendered by [`AppError`](crate::error::AppError).

pub mod handlers;

use crate::AppState;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/me", get(handlers::me))
        .route("/projects", post(handlers::create_project))
        .route("/projects/submit", post(handlers::submit_project))
        .route("/review/queue", get(handlers::basic_queue))
        .route("/review/basic", post(handlers::basic_vote))
        .route(
            "/review/second",
            get(handlers::second_queue).post(handlers::second_decision),
        )
        .route("/blackhole/submit", post(handlers::blackhole_submit))
        .route("/blackhole/pending", get(handlers::blackhole_pending))
        .route("/blackhole/approve", post(handlers::blackhole_approve))
        .route("/blackhole/reject", post(handlers::blackhole_reject))
        .route("/bet", get(handlers::list_bets))
        .route("/bet/place", post(handlers::place_bet))
        .route("/bet/claim", post(handlers::claim_bet))
        .route("/devlogs", post(handlers::create_devlog))
        .route("/quests", get(handlers::quests))
        .route("/quests/claim", post(handlers::claim_quest));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
