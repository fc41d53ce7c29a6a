//! Axum server exposing the latest published snapshot.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the most recent
//! snapshot, provider metadata, stats and uptime), [`build_router`] for
//! constructing the Axum router, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling. A router core that polls a JSON endpoint
//! for its dynamic configuration can point at `GET /api/config`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::sha256_hex;
use crate::dynamic::Configuration;
use crate::health::health_handler;

pub const CONFIG_VERSION_HEADER: &str = "x-config-version";

/// A snapshot as served: the decoded form for stats, the encoded form
/// for responses, and a content hash used for change detection.
#[derive(Debug)]
pub struct PublishedSnapshot {
    pub configuration: Configuration,
    pub body: Bytes,
    pub version: String,
    pub published_at: Instant,
}

#[derive(Debug)]
pub struct Stats {
    pub received: AtomicU64,
    pub changed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            changed: AtomicU64::new(0),
        }
    }
}

pub struct AppState {
    pub snapshot: RwLock<Option<Arc<PublishedSnapshot>>>,
    pub provider_name: String,
    pub poll_interval: String,
    pub instances: usize,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(
        provider_name: impl Into<String>,
        poll_interval: impl Into<String>,
        instances: usize,
    ) -> Self {
        Self {
            snapshot: RwLock::new(None),
            provider_name: provider_name.into(),
            poll_interval: poll_interval.into(),
            instances,
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }

    /// Record a snapshot received from the provider. Returns the stored
    /// snapshot when its content differs from the previous one.
    pub async fn publish(
        &self,
        configuration: Configuration,
    ) -> Result<Option<Arc<PublishedSnapshot>>, serde_json::Error> {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let body = Bytes::from(serde_json::to_vec(&configuration)?);
        let version = sha256_hex(&body);

        let mut current = self.snapshot.write().await;
        if current.as_ref().is_some_and(|s| s.version == version) {
            return Ok(None);
        }

        let published = Arc::new(PublishedSnapshot {
            configuration,
            body,
            version,
            published_at: Instant::now(),
        });
        *current = Some(Arc::clone(&published));
        drop(current);

        self.stats.changed.fetch_add(1, Ordering::Relaxed);
        Ok(Some(published))
    }

    pub async fn latest(&self) -> Option<Arc<PublishedSnapshot>> {
        self.snapshot.read().await.clone()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/config", get(config_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

pub async fn config_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.latest().await {
        Some(snapshot) => (
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::HeaderName::from_static(CONFIG_VERSION_HEADER),
                    snapshot.version.clone(),
                ),
            ],
            snapshot.body.clone(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "no configuration published yet" })),
        )
            .into_response(),
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
