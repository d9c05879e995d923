//! `handoff` -- serves one hot-reloadable heartbeat integration over HTTP.
//!
//! Reload with `POST /-/reload` or SIGHUP; stop with Ctrl-C.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use handoff_server::config::{self, Cli};
use handoff_server::integrations::{HeartbeatConfig, HeartbeatFactory, MetricsHandler};
use handoff_server::network::{AppState, ComponentInfo, NetworkModule, ShutdownController};
use handoff_server::reload::{FileReloader, Reload};
use handoff_server::supervisor::{ArtifactSource, Supervisor, SupervisorOptions};
use handoff_server::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_format)?;

    let initial: HeartbeatConfig = config::load(&cli.config).await?;
    let network_config = cli.network_config();
    let http_path = cli.integration_path();

    let options = SupervisorOptions::new(
        cli.integration_id.clone(),
        network_config.listen_addr(),
        http_path.clone(),
    )
    .with_state_change(|exports| {
        for target in &exports.targets {
            info!(?target, "exporting scrape target");
        }
    });
    let supervisor = Arc::new(
        Supervisor::new(options, HeartbeatFactory, initial)
            .context("initial configuration rejected")?,
    );

    let shutdown = Arc::new(ShutdownController::new());
    let reloader: Arc<dyn Reload> =
        Arc::new(FileReloader::new(&cli.config, Arc::clone(&supervisor)));

    let state = AppState {
        shutdown: Arc::clone(&shutdown),
        integration: Arc::clone(&supervisor) as Arc<dyn ArtifactSource<MetricsHandler>>,
        reloader: Arc::clone(&reloader),
        component: Arc::new(ComponentInfo {
            id: cli.integration_id.clone(),
            metrics_path: handoff_core::join_path(&http_path, "metrics"),
            exports: supervisor.exports().clone(),
        }),
        start_time: Instant::now(),
    };

    let supervisor_task = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        let token = shutdown.token();
        async move { supervisor.run(token).await }
    });

    #[cfg(unix)]
    tokio::spawn({
        let token = shutdown.token();
        async move {
            if let Err(err) = handoff_server::reload::reload_on_hangup(reloader, token).await {
                error!(error = %err, "failed to install SIGHUP handler");
            }
        }
    });

    let mut module = NetworkModule::new(network_config, state);
    let port = module.start().await?;
    shutdown.set_ready();
    info!(port, path = %http_path, "handoff ready");

    let signal = {
        let shutdown = Arc::clone(&shutdown);
        async move {
            let token = shutdown.token();
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        error!(error = %err, "failed to listen for Ctrl-C");
                    }
                    info!("shutdown signal received");
                }
                () = token.cancelled() => {}
            }
            shutdown.trigger_shutdown();
        }
    };
    module.serve(signal).await?;

    supervisor_task
        .await
        .context("supervisor task panicked")?
        .context("supervisor exited with an error")?;
    info!("handoff stopped");
    Ok(())
}
