//! Built-in `heartbeat` integration.
//!
//! Each worker owns a private Prometheus recorder that is never installed
//! globally, and ticks at the configured interval until cancelled.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use handoff_core::is_valid_label_name;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::handler::MetricsHandler;
use crate::supervisor::{SupervisorOptions, Worker, WorkerFactory};

const TICKS_TOTAL: &str = "heartbeat_ticks_total";
const LAST_TICK_SECONDS: &str = "heartbeat_last_tick_timestamp_seconds";
const UP: &str = "heartbeat_up";

fn default_interval_ms() -> u64 {
    15_000
}

/// Configuration of the heartbeat integration, decoded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatConfig {
    /// Tick interval in milliseconds. Must be non-zero.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Constant labels attached to every series.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            labels: BTreeMap::new(),
        }
    }
}

/// Reasons a heartbeat configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeartbeatConfigError {
    #[error("interval_ms must be greater than zero")]
    ZeroInterval,
    #[error("invalid label name {0:?}")]
    InvalidLabel(String),
}

impl HeartbeatConfig {
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), HeartbeatConfigError> {
        if self.interval_ms == 0 {
            return Err(HeartbeatConfigError::ZeroInterval);
        }
        if let Some(bad) = self.labels.keys().find(|name| !is_valid_label_name(name)) {
            return Err(HeartbeatConfigError::InvalidLabel(bad.clone()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Builds [`HeartbeatWorker`]s. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeartbeatFactory;

impl WorkerFactory for HeartbeatFactory {
    type Config = HeartbeatConfig;
    type Worker = HeartbeatWorker;

    fn create(
        &self,
        options: &SupervisorOptions,
        config: HeartbeatConfig,
    ) -> anyhow::Result<HeartbeatWorker> {
        config.validate()?;

        let builder = config
            .labels
            .iter()
            .fold(
                PrometheusBuilder::new().add_global_label("integration", options.id.as_str()),
                |builder, (name, value)| builder.add_global_label(name.as_str(), value.as_str()),
            );
        let recorder = builder.build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_counter!(TICKS_TOTAL, "Heartbeat ticks since this worker started.");
            describe_gauge!(LAST_TICK_SECONDS, "Unix time of the most recent tick.");
            describe_gauge!(UP, "1 while the worker runs, 0 once it has been cancelled.");
        });

        Ok(HeartbeatWorker {
            interval: Duration::from_millis(config.interval_ms),
            recorder,
            handle,
        })
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Ticks at a fixed interval and records heartbeat series.
pub struct HeartbeatWorker {
    interval: Duration,
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl HeartbeatWorker {
    fn tick(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        metrics::with_local_recorder(&self.recorder, || {
            counter!(TICKS_TOTAL).increment(1);
            gauge!(LAST_TICK_SECONDS).set(now);
        });
    }

    fn set_up(&self, up: bool) {
        metrics::with_local_recorder(&self.recorder, || {
            gauge!(UP).set(if up { 1.0 } else { 0.0 });
        });
    }

    /// Current exposition text of this worker's recorder.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl Worker for HeartbeatWorker {
    type Artifact = MetricsHandler;

    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        self.set_up(true);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick(),
            }
        }

        self.set_up(false);
        Ok(())
    }

    fn derive_artifact(&self) -> anyhow::Result<MetricsHandler> {
        let handle = self.handle.clone();
        Ok(MetricsHandler::from_renderer(move || handle.render()))
    }
}
