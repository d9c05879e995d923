//! Health, liveness, and readiness endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::network::HealthState;

/// Returns detailed health information as JSON.
///
/// Always returns 200; the `state` field and the `integration` object carry
/// the actual condition.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let health = state.shutdown.health_state();
    let status = state.integration.status();

    Json(json!({
        "state": health.as_str(),
        "in_flight": state.shutdown.in_flight_count(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "integration": status,
    }))
}

/// Liveness probe: 200 while the process answers at all.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe.
///
/// 200 only once the server is `Ready` and at least one worker has been
/// handed off; 503 during startup, before the first handoff, and while
/// draining.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    let ready = state.shutdown.health_state() == HealthState::Ready
        && state.integration.status().live_generation > 0;
    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
