//! HTTP handler definitions.
//!
//! `AppState` is the shared state carried through axum extractors. It holds
//! the supervisor only through its object-safe read side, so handlers do not
//! depend on the concrete worker factory.

pub mod components;
pub mod health;
pub mod metrics;
pub mod reload;

pub use components::components_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use metrics::metrics_handler;
pub use reload::reload_handler;

use std::sync::Arc;
use std::time::Instant;

use handoff_core::Exports;
use serde::Serialize;

use super::ShutdownController;
use crate::integrations::MetricsHandler;
use crate::reload::Reload;
use crate::supervisor::ArtifactSource;

/// Static description of the supervised component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    /// Component identifier (e.g. `"heartbeat"`).
    pub id: String,
    /// Path the metrics proxy is mounted on.
    pub metrics_path: String,
    /// Exports announced at construction.
    pub exports: Exports,
}

/// Shared application state passed to all handlers via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Read side of the supervisor: current handler and status.
    pub integration: Arc<dyn ArtifactSource<MetricsHandler>>,
    /// Re-applies the configuration file.
    pub reloader: Arc<dyn Reload>,
    pub component: Arc<ComponentInfo>,
    /// Process start time, used for uptime.
    pub start_time: Instant,
}
