//! Feeding configuration file changes into a supervisor.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{self, ConfigError};
use crate::supervisor::{Supervisor, SupervisorError, WorkerFactory};

/// Errors from a reload attempt. None of them disturb the live worker.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

impl ReloadError {
    /// Returns `true` if the supervisor has already stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(self, ReloadError::Supervisor(SupervisorError::Stopped))
    }
}

/// Something that can re-apply configuration on demand.
#[async_trait]
pub trait Reload: Send + Sync {
    async fn reload(&self) -> Result<(), ReloadError>;
}

/// Re-reads a JSON file and passes it to [`Supervisor::update`].
pub struct FileReloader<F: WorkerFactory> {
    path: PathBuf,
    supervisor: Arc<Supervisor<F>>,
}

impl<F: WorkerFactory> FileReloader<F> {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, supervisor: Arc<Supervisor<F>>) -> Self {
        Self {
            path: path.into(),
            supervisor,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<F> Reload for FileReloader<F>
where
    F: WorkerFactory,
    F::Config: DeserializeOwned,
{
    async fn reload(&self) -> Result<(), ReloadError> {
        let config = config::load::<F::Config>(&self.path).await?;
        self.supervisor.update(config)?;
        info!(path = %self.path.display(), "configuration reloaded");
        Ok(())
    }
}

/// Reloads on every SIGHUP until `shutdown` fires.
///
/// # Errors
///
/// Returns an error if the signal handler cannot be installed.
#[cfg(unix)]
pub async fn reload_on_hangup(
    reloader: Arc<dyn Reload>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            received = hangups.recv() => {
                if received.is_none() {
                    return Ok(());
                }
                info!("SIGHUP received, reloading configuration");
                if let Err(err) = reloader.reload().await {
                    warn!(error = %err, "reload failed, keeping current worker");
                }
            }
        }
    }
}
