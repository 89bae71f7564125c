//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/readyz`  : readiness (503 until one cycle fully succeeded)
//! - `/metrics` : Prometheus text format (also served on any other path)

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;

pub const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "waiting for first successful poll")
    }
}

/// Always the last reconciled state, even while the upstream is failing.
pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();

    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)], body).into_response()
}
