//! Configuration builder: one full snapshot from every configured instance.
//!
//! Instances are processed sequentially in declaration order. Each one
//! contributes its service descriptor unconditionally, then the routers
//! fetched from its upstream. A failed fetch is logged and skipped: the
//! instance publishes a service with no routers pointing at it, which the
//! router core tolerates, whereas a router pointing at a missing service
//! would be rejected. On router-name collisions the later instance wins.

use tokio::time::Instant;

use crate::config::model::ProviderConfig;
use crate::dynamic::Configuration;
use crate::error::FetchError;

use super::fetch::RouteFetcher;
use super::remap::remap;

/// Outcome of a single build, for callers that want more than the snapshot.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub configuration: Configuration,
    pub failures: Vec<(String, FetchError)>,
}

/// Build a snapshot. `now` is the tick that triggered the build; it is
/// only used for diagnostics and never influences the content.
pub async fn build_configuration(
    now: Instant,
    config: &ProviderConfig,
    fetcher: &dyn RouteFetcher,
) -> Configuration {
    build_with_report(now, config, fetcher).await.configuration
}

pub async fn build_with_report(
    now: Instant,
    config: &ProviderConfig,
    fetcher: &dyn RouteFetcher,
) -> BuildReport {
    let mut report = BuildReport::default();
    let http = &mut report.configuration.http;

    for (name, instance) in config.instances.iter() {
        http.services
            .insert(name.to_string(), instance.service.clone());

        let routes = match fetcher.fetch(instance).await {
            Ok(routes) => routes,
            Err(e) => {
                tracing::warn!(instance = %name, error = %e, "failed to fetch upstream routers");
                report.failures.push((name.to_string(), e));
                continue;
            }
        };

        for local in remap(name, instance, &routes) {
            if let Some(previous) = http.routers.insert(local.name.clone(), local.router) {
                if previous.service != name {
                    tracing::debug!(
                        router = %local.name,
                        previous = %previous.service,
                        instance = %name,
                        "router name collision, later instance wins"
                    );
                }
            }
        }
    }

    tracing::debug!(
        routers = report.configuration.router_count(),
        services = report.configuration.service_count(),
        failed = report.failures.len(),
        build_ms = u64::try_from(now.elapsed().as_millis()).unwrap_or(u64::MAX),
        "configuration built"
    );

    report
}
