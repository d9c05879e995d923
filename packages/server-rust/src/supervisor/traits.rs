//! Collaborator contracts consumed and exposed by the [`Supervisor`](super::Supervisor).

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::options::SupervisorOptions;
use super::state::SupervisorStatus;

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// Why the published artifact cannot serve real content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// No handoff has happened yet.
    NotStarted,
    /// The live worker could not produce an artifact; carries the error text.
    DerivationFailed(String),
}

/// Externally visible object derived from the live worker.
///
/// Cloning must be cheap: every reader gets its own clone.
pub trait Artifact: Clone + Send + Sync + 'static {
    /// Deterministic placeholder published when no real artifact exists.
    fn unavailable(reason: &Unavailable) -> Self;
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Long-running unit of work owned by a supervisor.
///
/// The supervisor calls `derive_artifact` once per handoff and then spawns
/// `run` with a token that is cancelled when the worker is superseded or the
/// supervisor stops. `run` should return promptly after cancellation; its
/// result is logged and otherwise ignored.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// The artifact type readers fetch while this worker is live.
    type Artifact: Artifact;

    /// Runs until `cancel` fires or the work finishes on its own.
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()>;

    /// Builds the externally visible artifact. Expected to be cheap.
    fn derive_artifact(&self) -> anyhow::Result<Self::Artifact>;
}

// ---------------------------------------------------------------------------
// WorkerFactory
// ---------------------------------------------------------------------------

/// Turns a configuration value into a runnable worker.
///
/// Called synchronously from `Supervisor::update`. There is no timeout around
/// it: a factory that hangs stalls every later update.
pub trait WorkerFactory: Send + Sync + 'static {
    /// Typed configuration accepted by `create`.
    type Config: Send + 'static;
    /// Worker produced by `create`.
    type Worker: Worker;

    /// Builds a worker for `config`.
    ///
    /// # Errors
    ///
    /// Any error means the configuration is rejected; the supervisor keeps the
    /// previous worker.
    fn create(
        &self,
        options: &SupervisorOptions,
        config: Self::Config,
    ) -> anyhow::Result<Self::Worker>;
}

// ---------------------------------------------------------------------------
// ArtifactSource
// ---------------------------------------------------------------------------

/// Object-safe read side of a supervisor, held by HTTP handlers.
pub trait ArtifactSource<A>: Send + Sync {
    /// Returns the currently published artifact. Never blocks on worker
    /// startup or shutdown.
    fn artifact(&self) -> A;

    /// Snapshot of the supervisor's handoff bookkeeping.
    fn status(&self) -> SupervisorStatus;
}
