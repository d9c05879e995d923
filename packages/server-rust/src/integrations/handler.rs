//! The HTTP handler artifact published by metrics-exposing workers.

use std::convert::Infallible;

use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use crate::supervisor::{Artifact, Unavailable};

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// A cloneable request handler serving one worker's metrics.
///
/// Wraps an axum `Router` whose fallback answers every path, so the outer
/// server can forward requests unchanged.
#[derive(Clone)]
pub struct MetricsHandler {
    router: Router,
}

impl MetricsHandler {
    /// Serves the output of `render` in Prometheus text format.
    pub fn from_renderer<R>(render: R) -> Self
    where
        R: Fn() -> String + Clone + Send + Sync + 'static,
    {
        let router = Router::new().fallback(move || {
            let render = render.clone();
            async move { ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], render()) }
        });
        Self { router }
    }

    /// Handles one request.
    pub async fn serve(self, request: Request) -> Response {
        let result: Result<Response, Infallible> = self.router.oneshot(request).await;
        match result {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

impl Artifact for MetricsHandler {
    fn unavailable(reason: &Unavailable) -> Self {
        let (status, body) = match reason {
            Unavailable::NotStarted => (
                StatusCode::SERVICE_UNAVAILABLE,
                "integration has not started yet".to_string(),
            ),
            Unavailable::DerivationFailed(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to create metrics handler: {err}"),
            ),
        };
        let router = Router::new().fallback(move || {
            let body = body.clone();
            async move { (status, body) }
        });
        Self { router }
    }
}

impl std::fmt::Debug for MetricsHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsHandler").finish_non_exhaustive()
    }
}
