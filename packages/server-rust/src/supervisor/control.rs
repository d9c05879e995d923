//! The hot-reload supervisor and its control loop.
//!
//! ```text
//! update(cfg) ── factory.create ──► store latest (guard) ──► notify_one
//!                                                                │
//! run(token): select { token.cancelled => stop, reload.notified ─┘ }
//!     └─ handoff: claim latest (guard) → cancel previous → derive artifact
//!                 → publish (guard) → spawn worker.run(child token)
//! ```
//!
//! The reload signal is a `Notify`: it stores at most one permit and never
//! blocks the notifier, so bursts of updates collapse into a single handoff
//! that picks up the latest worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use handoff_core::{scrape_target, Exports};
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::SupervisorError;
use super::options::SupervisorOptions;
use super::state::{Handoff, SharedState, SupervisorStatus};
use super::traits::{Artifact, ArtifactSource, Unavailable, Worker, WorkerFactory};

type ArtifactOf<F> = <<F as WorkerFactory>::Worker as Worker>::Artifact;

/// Owns exactly one live worker at a time and swaps it on every update.
pub struct Supervisor<F: WorkerFactory> {
    options: SupervisorOptions,
    factory: F,
    state: Mutex<SharedState<F::Worker>>,
    reload: Notify,
    handoffs: watch::Sender<u64>,
    running: AtomicBool,
    exports: Exports,
}

impl<F: WorkerFactory> Supervisor<F> {
    /// Builds a supervisor and applies `initial` as its first configuration.
    ///
    /// The exports announcement is computed here and passed to
    /// `options.on_state_change` exactly once. No worker runs until
    /// [`run`](Self::run) is called.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::Construction` if the factory rejects `initial`.
    pub fn new(
        options: SupervisorOptions,
        factory: F,
        initial: F::Config,
    ) -> Result<Self, SupervisorError> {
        let target = scrape_target(&options.http_listen_addr, &options.http_path, &options.id)
            .map_err(|e| SupervisorError::Construction(e.into()))?;
        let (handoffs, _rx) = watch::channel(0);

        let supervisor = Self {
            options,
            factory,
            state: Mutex::new(SharedState::new()),
            reload: Notify::new(),
            handoffs,
            running: AtomicBool::new(false),
            exports: Exports {
                targets: vec![target],
            },
        };
        supervisor.update(initial)?;

        if let Some(on_state_change) = &supervisor.options.on_state_change {
            on_state_change(&supervisor.exports);
        }
        Ok(supervisor)
    }

    /// Builds a new worker from `config` and schedules a handoff to it.
    ///
    /// Never blocks on the control loop. A failed construction leaves the
    /// live worker and its artifact untouched.
    ///
    /// # Errors
    ///
    /// `Construction` if the factory fails, `Stopped` after the control loop
    /// has terminated.
    pub fn update(&self, config: F::Config) -> Result<(), SupervisorError> {
        if self.state.lock().is_stopped() {
            return Err(SupervisorError::Stopped);
        }

        let worker = self
            .factory
            .create(&self.options, config)
            .map_err(SupervisorError::Construction)?;

        let generation = self
            .state
            .lock()
            .store(Arc::new(worker))
            .ok_or(SupervisorError::Stopped)?;

        self.reload.notify_one();
        debug!(id = %self.options.id, generation, "worker constructed, handoff scheduled");
        Ok(())
    }

    /// Runs the control loop until `shutdown` is cancelled.
    ///
    /// Each worker runs under a child of `shutdown`, so cancelling it also
    /// reaches the live worker. Returns `Ok(())` on cancellation.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` if another call is active, `Stopped` if the loop
    /// already terminated.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), SupervisorError> {
        if self.state.lock().is_stopped() {
            return Err(SupervisorError::Stopped);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SupervisorError::AlreadyRunning);
        }
        info!(id = %self.options.id, "supervisor started");

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    self.stop();
                    return Ok(());
                }
                () = self.reload.notified() => self.hand_off(&shutdown),
            }
        }
    }

    fn hand_off(&self, shutdown: &CancellationToken) {
        let Some(Handoff {
            generation,
            worker,
            previous,
        }) = self.state.lock().begin_handoff()
        else {
            debug!(id = %self.options.id, "reload signal already covered by an earlier handoff");
            return;
        };

        // Fire-and-forget: the old worker may still be winding down when the
        // new one starts.
        if let Some(previous) = previous {
            previous.cancel();
        }

        let (artifact, available) = match worker.derive_artifact() {
            Ok(artifact) => (artifact, true),
            Err(err) => {
                warn!(
                    id = %self.options.id,
                    generation,
                    error = %format!("{err:#}"),
                    "failed to derive artifact from worker"
                );
                let reason = Unavailable::DerivationFailed(format!("{err:#}"));
                (<ArtifactOf<F> as Artifact>::unavailable(&reason), false)
            }
        };

        let cancel = shutdown.child_token();
        self.state.lock().publish(artifact, available, cancel.clone());
        self.handoffs.send_replace(generation);

        let id = self.options.id.clone();
        tokio::spawn(async move {
            match worker.run(cancel).await {
                Ok(()) => debug!(%id, generation, "worker exited"),
                Err(err) => warn!(
                    %id,
                    generation,
                    error = %format!("{err:#}"),
                    "worker exited with error"
                ),
            }
        });

        info!(id = %self.options.id, generation, available, "handed off to new worker");
    }

    fn stop(&self) {
        let live = self.state.lock().stop();
        if let Some(live) = live {
            live.cancel();
        }
        info!(id = %self.options.id, "supervisor stopped");
    }

    /// Returns the artifact of the live worker, or a placeholder.
    pub fn artifact(&self) -> ArtifactOf<F> {
        self.state.lock().artifact()
    }

    #[must_use]
    pub fn status(&self) -> SupervisorStatus {
        self.state.lock().status()
    }

    /// The announcement computed at construction. Unaffected by reloads.
    #[must_use]
    pub fn exports(&self) -> &Exports {
        &self.exports
    }

    /// Receiver that observes the generation of each completed handoff.
    #[must_use]
    pub fn subscribe_handoffs(&self) -> watch::Receiver<u64> {
        self.handoffs.subscribe()
    }
}

impl<F: WorkerFactory> ArtifactSource<ArtifactOf<F>> for Supervisor<F> {
    fn artifact(&self) -> ArtifactOf<F> {
        Supervisor::artifact(self)
    }

    fn status(&self) -> SupervisorStatus {
        Supervisor::status(self)
    }
}
