use std::fmt;
use std::sync::Arc;

use handoff_core::Exports;

/// Callback receiving the one-time exports announcement.
pub type StateChangeFn = Arc<dyn Fn(&Exports) + Send + Sync>;

/// Static options a supervisor is built with. Passed to the worker factory
/// on every `create` call.
#[derive(Clone)]
pub struct SupervisorOptions {
    /// Component identifier, e.g. `"heartbeat"`. Used in logs and exports.
    pub id: String,
    /// `host:port` the HTTP server is reachable at.
    pub http_listen_addr: String,
    /// Base HTTP path for this component; metrics live at `{http_path}/metrics`.
    pub http_path: String,
    /// Invoked once at construction with the exports announcement.
    pub on_state_change: Option<StateChangeFn>,
}

impl SupervisorOptions {
    /// Options with no state-change callback.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        http_listen_addr: impl Into<String>,
        http_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            http_listen_addr: http_listen_addr.into(),
            http_path: http_path.into(),
            on_state_change: None,
        }
    }

    #[must_use]
    pub fn with_state_change(mut self, f: impl Fn(&Exports) + Send + Sync + 'static) -> Self {
        self.on_state_change = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for SupervisorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorOptions")
            .field("id", &self.id)
            .field("http_listen_addr", &self.http_listen_addr)
            .field("http_path", &self.http_path)
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}
