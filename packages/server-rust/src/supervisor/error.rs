/// Errors returned by [`Supervisor`](super::Supervisor) entry points.
///
/// Derivation failures never appear here: they are published as an
/// unavailable artifact instead.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to construct worker: {0:#}")]
    Construction(#[source] anyhow::Error),
    #[error("supervisor has stopped")]
    Stopped,
    #[error("supervisor control loop is already running")]
    AlreadyRunning,
}

impl SupervisorError {
    /// Returns `true` if the error came from the worker factory.
    #[must_use]
    pub fn is_construction(&self) -> bool {
        matches!(self, SupervisorError::Construction(_))
    }
}
