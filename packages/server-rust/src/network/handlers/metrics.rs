//! Proxy from the fixed metrics route to whatever handler is currently published.

use axum::extract::{Request, State};
use axum::response::Response;

use super::AppState;

/// Forwards the request to the live worker's handler.
///
/// The handler is fetched per request, so a reload takes effect on the next
/// scrape without re-registering routes. The request counts as in flight
/// until the response is produced.
pub async fn metrics_handler(State(state): State<AppState>, request: Request) -> Response {
    let _in_flight = state.shutdown.in_flight_guard();
    state.integration.artifact().serve(request).await
}
