//! Axum router wiring.
//!
//! Ingest routes accept POSTed bodies up to `server.max_body_bytes`; scrape
//! and ops routes are plain GETs.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let limit = state.cfg().server.max_body_bytes;

    Router::new()
        .route("/v1/ingest", post(transport::http::ingest_exposition))
        .route("/v1/cloudwatch", post(transport::http::ingest_cloudwatch))
        .layer(DefaultBodyLimit::max(limit))
        .route("/metrics", get(ops::metrics))
        .route("/internal/metrics", get(ops::internal_metrics))
        .route("/healthz", get(ops::healthz))
        .with_state(state)
}
