//! Hot-reload supervision of a single long-running worker.
//!
//! 1. **Construction** (`Supervisor::new`): applies the first configuration and
//!    announces the component's exports once.
//! 2. **Update** (`Supervisor::update`): builds a worker through the factory and
//!    schedules a handoff without blocking.
//! 3. **Control loop** (`Supervisor::run`): cancels the superseded worker,
//!    publishes the new worker's artifact, and starts it under a child token.
//! 4. **Reads** (`Supervisor::artifact`): O(1) clone of the published artifact.

pub mod control;
pub mod error;
pub mod options;
pub mod state;
pub mod traits;

pub use control::Supervisor;
pub use error::SupervisorError;
pub use options::{StateChangeFn, SupervisorOptions};
pub use state::SupervisorStatus;
pub use traits::{Artifact, ArtifactSource, Unavailable, Worker, WorkerFactory};
