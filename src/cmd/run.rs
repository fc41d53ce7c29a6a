//! `routesync run` — start the provider and serve its snapshots.
//!
//! Loads and validates the configuration, starts the polling
//! [`Provider`], consumes every published snapshot into the shared
//! [`AppState`], and serves it over HTTP until SIGTERM / Ctrl+C.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cli::RunArgs;
use crate::config;
use crate::dynamic::Configuration;
use crate::error::RouteSyncError;
use crate::logging;
use crate::provider::Provider;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), RouteSyncError> {
    logging::init(
        &args.log_level,
        logging::resolve_format(args.pretty, args.json),
    );

    let path = config::resolve_config_path(args.config.as_deref()).await?;
    let provider_config = config::load_file(&path).await?;

    let state = Arc::new(AppState::new(
        args.name.clone(),
        provider_config.poll_interval.clone(),
        provider_config.instances.len(),
    ));

    let mut provider = Provider::new(provider_config, args.name.clone())?;
    provider.init()?;

    // Capacity 1: the provider blocks on send until the previous snapshot
    // has been taken, so a stalled consumer slows polling down.
    let (snapshot_tx, snapshot_rx) = mpsc::channel(1);
    provider.provide(snapshot_tx)?;

    let consumer = tokio::spawn(consume_snapshots(
        Arc::clone(&state),
        snapshot_rx,
        args.output.clone(),
    ));

    let router = server::build_router(state);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        config = %path.display(),
        provider = %args.name,
        "routesync started"
    );

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await;

    provider.stop()?;
    provider.wait().await;

    if let Err(e) = consumer.await {
        tracing::error!(error = %e, "snapshot consumer failed");
    }

    served?;
    tracing::info!("routesync stopped");
    Ok(())
}

async fn consume_snapshots(
    state: Arc<AppState>,
    mut snapshots: mpsc::Receiver<Configuration>,
    output: Option<PathBuf>,
) {
    while let Some(configuration) = snapshots.recv().await {
        match state.publish(configuration).await {
            Ok(Some(published)) => {
                tracing::info!(
                    version = %published.version.get(..8).unwrap_or(&published.version),
                    routers = published.configuration.router_count(),
                    services = published.configuration.service_count(),
                    "configuration changed"
                );
                if let Some(ref path) = output {
                    let written = match serde_json::to_vec_pretty(&published.configuration) {
                        Ok(pretty) => write_snapshot(path, &pretty).await,
                        Err(e) => Err(e.into()),
                    };
                    if let Err(e) = written {
                        tracing::error!(
                            path = %path.display(),
                            error = %e,
                            "failed to write snapshot"
                        );
                    }
                }
            }
            Ok(None) => tracing::debug!("configuration unchanged"),
            Err(e) => tracing::error!(error = %e, "failed to encode snapshot"),
        }
    }
    tracing::debug!("snapshot channel closed");
}

/// Write via a sibling temp file and rename, so readers never see a
/// partially written snapshot.
pub async fn write_snapshot(path: &Path, body: &[u8]) -> Result<(), RouteSyncError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
