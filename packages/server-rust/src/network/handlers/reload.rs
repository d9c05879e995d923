//! `POST /-/reload`: re-read the configuration file and hand it to the supervisor.

use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use super::AppState;

/// 200 on success, 503 once the supervisor has stopped, 400 for any
/// configuration problem (the live worker keeps serving).
pub async fn reload_handler(State(state): State<AppState>) -> (StatusCode, String) {
    match state.reloader.reload().await {
        Ok(()) => (StatusCode::OK, "config reloaded\n".to_string()),
        Err(err) if err.is_stopped() => (StatusCode::SERVICE_UNAVAILABLE, format!("{err}\n")),
        Err(err) => {
            warn!(error = %err, "reload request rejected");
            (StatusCode::BAD_REQUEST, format!("{err}\n"))
        }
    }
}
