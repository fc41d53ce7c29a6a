//! `routesync snapshot` — build one snapshot and print it.
//!
//! Runs a single build against every configured instance, reports
//! per-instance failures on stderr and writes the merged configuration
//! as pretty JSON to stdout.

use tokio::time::Instant;

use crate::cli::SnapshotArgs;
use crate::config;
use crate::error::RouteSyncError;
use crate::logging::{self, LogFormat};
use crate::provider::builder::build_with_report;
use crate::provider::fetch::HttpFetcher;
use crate::provider::fetch_timeout;

pub async fn execute(args: SnapshotArgs) -> Result<(), RouteSyncError> {
    logging::init(&args.log_level, LogFormat::Pretty);

    let path = config::resolve_config_path(args.config.as_deref()).await?;
    let provider_config = config::load_file(&path).await?;

    let fetcher = HttpFetcher::new(fetch_timeout(&provider_config)?);
    let report = build_with_report(Instant::now(), &provider_config, &fetcher).await;

    for (instance, error) in &report.failures {
        eprintln!("\u{2717} {instance}: {error}");
    }

    println!("{}", serde_json::to_string_pretty(&report.configuration)?);
    Ok(())
}
