//! Shared mutable state of a supervisor.
//!
//! Everything here lives behind one `parking_lot::Mutex` owned by the
//! supervisor. Methods only swap references; none of them block, derive
//! artifacts, or touch the factory, so the guard is never held across a slow
//! call.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::traits::{Artifact, Unavailable, Worker};

/// Snapshot of handoff bookkeeping, exposed for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupervisorStatus {
    /// Generation of the most recently constructed worker. Starts at 0 and is
    /// bumped by every successful update.
    pub generation: u64,
    /// Generation of the worker that was last handed off. Equal to
    /// `generation` once the control loop has caught up.
    pub live_generation: u64,
    /// Whether a worker has been handed off and its token is not yet
    /// cancelled. Says nothing about whether its `run` is still executing.
    pub live: bool,
    /// Whether the published artifact is real (as opposed to a placeholder).
    pub available: bool,
    /// Whether the supervisor has reached its terminal state.
    pub stopped: bool,
}

/// Result of claiming a pending worker for handoff.
pub(super) struct Handoff<W> {
    pub generation: u64,
    pub worker: Arc<W>,
    /// Cancellation handle of the worker being superseded, if any.
    pub previous: Option<CancellationToken>,
}

pub(super) struct SharedState<W: Worker> {
    /// Most recently constructed worker. Replaced, never mutated.
    latest: Option<Arc<W>>,
    generation: u64,
    live_generation: u64,
    /// Artifact derived from the live worker, or a placeholder.
    artifact: W::Artifact,
    available: bool,
    /// Cancellation handle of the live worker. At most one at a time.
    live_cancel: Option<CancellationToken>,
    stopped: bool,
}

impl<W: Worker> SharedState<W> {
    pub fn new() -> Self {
        Self {
            latest: None,
            generation: 0,
            live_generation: 0,
            artifact: W::Artifact::unavailable(&Unavailable::NotStarted),
            available: false,
            live_cancel: None,
            stopped: false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Stores a freshly constructed worker and returns its generation.
    ///
    /// Returns `None` if the supervisor already stopped; the worker is dropped.
    pub fn store(&mut self, worker: Arc<W>) -> Option<u64> {
        if self.stopped {
            return None;
        }
        self.generation += 1;
        self.latest = Some(worker);
        Some(self.generation)
    }

    /// Claims the latest worker for handoff if it has not been handed off yet.
    ///
    /// Takes the live cancellation handle with it so the caller can cancel the
    /// superseded worker outside the guard. Returns `None` when the latest
    /// worker is already live, which happens when a reload signal arrives for
    /// an update that an earlier handoff already picked up.
    pub fn begin_handoff(&mut self) -> Option<Handoff<W>> {
        if self.stopped || self.generation == self.live_generation {
            return None;
        }
        let worker = Arc::clone(self.latest.as_ref()?);
        self.live_generation = self.generation;
        Some(Handoff {
            generation: self.generation,
            worker,
            previous: self.live_cancel.take(),
        })
    }

    /// Publishes the artifact for the worker just handed off and records its
    /// cancellation handle.
    pub fn publish(&mut self, artifact: W::Artifact, available: bool, cancel: CancellationToken) {
        self.artifact = artifact;
        self.available = available;
        self.live_cancel = Some(cancel);
    }

    /// Marks the terminal state and hands back the live cancellation handle.
    pub fn stop(&mut self) -> Option<CancellationToken> {
        self.stopped = true;
        self.live_cancel.take()
    }

    pub fn artifact(&self) -> W::Artifact {
        self.artifact.clone()
    }

    pub fn status(&self) -> SupervisorStatus {
        SupervisorStatus {
            generation: self.generation,
            live_generation: self.live_generation,
            live: self.live_cancel.is_some(),
            available: self.available,
            stopped: self.stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Label {
        Real(&'static str),
        Placeholder(Unavailable),
    }

    impl Artifact for Label {
        fn unavailable(reason: &Unavailable) -> Self {
            Label::Placeholder(reason.clone())
        }
    }

    struct Named(&'static str);

    #[async_trait]
    impl Worker for Named {
        type Artifact = Label;

        async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
            cancel.cancelled().await;
            Ok(())
        }

        fn derive_artifact(&self) -> anyhow::Result<Label> {
            Ok(Label::Real(self.0))
        }
    }

    #[test]
    fn starts_with_not_started_placeholder() {
        let state = SharedState::<Named>::new();
        assert_eq!(state.artifact(), Label::Placeholder(Unavailable::NotStarted));
        let status = state.status();
        assert_eq!(status.generation, 0);
        assert!(!status.live);
        assert!(!status.available);
    }

    #[test]
    fn begin_handoff_without_worker_is_none() {
        let mut state = SharedState::<Named>::new();
        assert!(state.begin_handoff().is_none());
    }

    #[test]
    fn store_bumps_generation_and_handoff_claims_latest() {
        let mut state = SharedState::<Named>::new();
        assert_eq!(state.store(Arc::new(Named("a"))), Some(1));
        assert_eq!(state.store(Arc::new(Named("b"))), Some(2));

        let handoff = state.begin_handoff().expect("pending worker");
        assert_eq!(handoff.generation, 2);
        assert_eq!(handoff.worker.0, "b");
        assert!(handoff.previous.is_none());

        // Same generation again: coalesced signal, nothing to do.
        assert!(state.begin_handoff().is_none());
    }

    #[test]
    fn handoff_takes_previous_cancel_handle() {
        let mut state = SharedState::<Named>::new();
        state.store(Arc::new(Named("a")));
        let first = state.begin_handoff().unwrap();
        let token = CancellationToken::new();
        state.publish(Label::Real(first.worker.0), true, token.clone());
        assert!(state.status().live);

        state.store(Arc::new(Named("b")));
        let second = state.begin_handoff().unwrap();
        let previous = second.previous.expect("previous handle");
        previous.cancel();
        assert!(token.is_cancelled());
        assert!(!state.status().live);
    }

    #[test]
    fn stop_rejects_later_stores_and_handoffs() {
        let mut state = SharedState::<Named>::new();
        state.store(Arc::new(Named("a")));
        let handoff = state.begin_handoff().unwrap();
        let token = CancellationToken::new();
        state.publish(Label::Real(handoff.worker.0), true, token.clone());

        let live = state.stop().expect("live handle");
        live.cancel();
        assert!(token.is_cancelled());
        assert!(state.stop().is_none(), "handle is handed out only once");

        assert_eq!(state.store(Arc::new(Named("b"))), None);
        assert!(state.begin_handoff().is_none());
        assert!(state.status().stopped);
    }
}
