//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload containing the crate
//! version, uptime, provider metadata, the current snapshot's version
//! and size, and cumulative publish statistics. Status is `starting`
//! until the provider has published its first snapshot.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub provider: ProviderHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotHealth>,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct ProviderHealth {
    pub name: String,
    pub poll_interval: String,
    pub instances: usize,
}

#[derive(Serialize, Deserialize)]
pub struct SnapshotHealth {
    pub version: String,
    pub published_ago_seconds: u64,
    pub routers: usize,
    pub services: usize,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub snapshots_received: u64,
    pub snapshots_changed: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.latest().await.map(|s| SnapshotHealth {
        version: s.version.get(..8).unwrap_or(&s.version).to_string(),
        published_ago_seconds: s.published_at.elapsed().as_secs(),
        routers: s.configuration.router_count(),
        services: s.configuration.service_count(),
    });

    Json(HealthResponse {
        status: if snapshot.is_some() { "healthy" } else { "starting" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        provider: ProviderHealth {
            name: state.provider_name.clone(),
            poll_interval: state.poll_interval.clone(),
            instances: state.instances,
        },
        snapshot,
        stats: StatsResponse {
            snapshots_received: state.stats.received.load(Ordering::Relaxed),
            snapshots_changed: state.stats.changed.load(Ordering::Relaxed),
        },
    })
}
