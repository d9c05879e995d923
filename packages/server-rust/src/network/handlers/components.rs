//! `GET /api/v0/components`: what the supervisor is running and where it is scraped.

use axum::extract::State;
use axum::Json;
use handoff_core::Exports;
use serde::Serialize;

use super::AppState;
use crate::supervisor::SupervisorStatus;

/// Coarse health of a supervised component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentHealth {
    /// A worker is live and its handler is serving. Worker `run` errors are
    /// only logged, so this does not prove the worker is still ticking.
    Healthy,
    /// No worker yet, or the live worker's handler could not be derived.
    Unhealthy,
    /// The supervisor has shut down.
    Exited,
}

impl ComponentHealth {
    #[must_use]
    pub fn from_status(status: &SupervisorStatus) -> Self {
        if status.stopped {
            Self::Exited
        } else if status.live && status.available {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentView {
    pub id: String,
    pub health: ComponentHealth,
    pub generation: u64,
    pub live_generation: u64,
    pub metrics_path: String,
    pub exports: Exports,
}

pub async fn components_handler(State(state): State<AppState>) -> Json<Vec<ComponentView>> {
    let status = state.integration.status();
    let component = &state.component;

    Json(vec![ComponentView {
        id: component.id.clone(),
        health: ComponentHealth::from_status(&status),
        generation: status.generation,
        live_generation: status.live_generation,
        metrics_path: component.metrics_path.clone(),
        exports: component.exports.clone(),
    }])
}
