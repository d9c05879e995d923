//! Concrete workers and the artifact type they publish.

pub mod handler;
pub mod heartbeat;

pub use handler::{MetricsHandler, PROMETHEUS_CONTENT_TYPE};
pub use heartbeat::{HeartbeatConfig, HeartbeatConfigError, HeartbeatFactory, HeartbeatWorker};
