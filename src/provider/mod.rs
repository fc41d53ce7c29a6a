//! Polling provider: fetch, remap and publish on every tick.
//!
//! A [`Provider`] owns one background task. On each tick of its poll
//! interval the task builds a complete [`Configuration`] from every
//! configured instance ([`builder`]) and sends it on the output channel.
//! Sending waits for channel capacity, so a slow consumer stretches the
//! cadence instead of losing snapshots.
//!
//! Lifecycle: [`Provider::new`] → [`Provider::init`] →
//! [`Provider::provide`] → [`Provider::stop`]. Cancellation is a `watch`
//! channel checked at the top of every iteration and raced against the
//! tick, the build and the send.

pub mod builder;
pub mod fetch;
pub mod remap;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::duration::ConfigDuration;
use crate::config::model::ProviderConfig;
use crate::dynamic::Configuration;
use crate::error::RouteSyncError;
use builder::build_configuration;
use fetch::{HttpFetcher, RouteFetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderState {
    /// Constructed, not started
    #[default]
    Idle,
    /// Background task is ticking
    Running,
    /// Stopped; terminal
    Stopped,
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<ConfigDuration, RouteSyncError> {
    value
        .parse::<ConfigDuration>()
        .map_err(|reason| RouteSyncError::InvalidDuration {
            field,
            value: value.to_string(),
            reason,
        })
}

fn positive(
    field: &'static str,
    value: &str,
    duration: ConfigDuration,
) -> Result<Duration, RouteSyncError> {
    duration
        .to_std()
        .ok_or_else(|| RouteSyncError::NonPositiveDuration {
            field,
            value: value.to_string(),
        })
}

/// The per-request upstream timeout configured by `fetchTimeout`.
pub fn fetch_timeout(config: &ProviderConfig) -> Result<Duration, RouteSyncError> {
    let timeout = parse_duration("fetchTimeout", &config.fetch_timeout)?;
    positive("fetchTimeout", &config.fetch_timeout, timeout)
}

pub struct Provider {
    name: String,
    poll_interval: ConfigDuration,
    config: Arc<ProviderConfig>,
    fetcher: Arc<dyn RouteFetcher>,
    state: ProviderState,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Provider {
    /// Create a provider that fetches over HTTP(S).
    ///
    /// Fails when `pollInterval` or `fetchTimeout` is not a valid duration,
    /// or when `fetchTimeout` is not positive.
    pub fn new(config: ProviderConfig, name: impl Into<String>) -> Result<Self, RouteSyncError> {
        let timeout = fetch_timeout(&config)?;
        Self::with_fetcher(config, name, Arc::new(HttpFetcher::new(timeout)))
    }

    /// Create a provider with a custom [`RouteFetcher`].
    pub fn with_fetcher(
        config: ProviderConfig,
        name: impl Into<String>,
        fetcher: Arc<dyn RouteFetcher>,
    ) -> Result<Self, RouteSyncError> {
        let poll_interval = parse_duration("pollInterval", &config.poll_interval)?;
        Ok(Self {
            name: name.into(),
            poll_interval,
            config: Arc::new(config),
            fetcher,
            state: ProviderState::Idle,
            shutdown: None,
            task: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn poll_interval(&self) -> ConfigDuration {
        self.poll_interval
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> ProviderState {
        self.state
    }

    fn interval(&self) -> Result<Duration, RouteSyncError> {
        positive("pollInterval", &self.config.poll_interval, self.poll_interval)
    }

    /// Check that the poll interval is strictly positive.
    pub fn init(&self) -> Result<(), RouteSyncError> {
        self.interval().map(|_| ())
    }

    /// Start publishing snapshots to `sender`. Must be called from within
    /// a Tokio runtime.
    ///
    /// The first snapshot is sent one full poll interval after this call.
    pub fn provide(&mut self, sender: mpsc::Sender<Configuration>) -> Result<(), RouteSyncError> {
        if self.state != ProviderState::Idle {
            return Err(RouteSyncError::InvalidState {
                name: self.name.clone(),
                state: self.state.to_string(),
            });
        }
        let interval = self.interval()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = Poller {
            name: self.name.clone(),
            interval,
            config: Arc::clone(&self.config),
            fetcher: Arc::clone(&self.fetcher),
        };

        let name = self.name.clone();
        let handle = tokio::spawn(async move {
            // A panic inside the loop surfaces here as a JoinError and stops
            // at this task instead of reaching the host.
            let poll_loop = tokio::spawn(poller.run(sender, shutdown_rx));
            match poll_loop.await {
                Ok(()) => {}
                Err(e) if e.is_panic() => {
                    tracing::error!(provider = %name, error = %e, "poll loop panicked");
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "poll loop aborted");
                }
            }
        });

        self.shutdown = Some(shutdown_tx);
        self.task = Some(handle);
        self.state = ProviderState::Running;

        tracing::info!(
            provider = %self.name,
            poll_interval = %self.poll_interval,
            instances = self.config.instances.len(),
            "provider started"
        );
        Ok(())
    }

    /// Signal the background task to stop. Safe to call in any state and
    /// more than once.
    pub fn stop(&mut self) -> Result<(), RouteSyncError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
            tracing::info!(provider = %self.name, "provider stopped");
        }
        self.state = ProviderState::Stopped;
        Ok(())
    }

    /// Wait for the background task to exit. Returns immediately if the
    /// provider was never started or has already been waited on.
    pub async fn wait(&mut self) {
        if let Some(handle) = self.task.take() {
            if let Err(e) = handle.await {
                tracing::error!(provider = %self.name, error = %e, "provider task failed");
            }
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("poll_interval", &self.poll_interval)
            .field("instances", &self.config.instances.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

struct Poller {
    name: String,
    interval: Duration,
    config: Arc<ProviderConfig>,
    fetcher: Arc<dyn RouteFetcher>,
}

impl Poller {
    async fn run(self, sender: mpsc::Sender<Configuration>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // `changed()` also resolves (with an error) once the Provider and its
        // sender half are dropped, which ends the loop the same way.
        loop {
            if *shutdown.borrow() {
                break;
            }

            let now = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                now = ticker.tick() => now,
            };

            let configuration = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                configuration = build_configuration(now, &self.config, self.fetcher.as_ref()) => {
                    configuration
                }
            };

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                sent = sender.send(configuration) => {
                    if sent.is_err() {
                        tracing::warn!(
                            provider = %self.name,
                            "snapshot receiver dropped, stopping"
                        );
                        break;
                    }
                    tracing::trace!(provider = %self.name, "snapshot published");
                }
            }
        }

        tracing::debug!(provider = %self.name, "poll loop shutting down");
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::model::InstanceConfig;
    use crate::error::FetchError;
    use fetch::FetchedRoute;

    struct NoRoutes;

    #[async_trait]
    impl RouteFetcher for NoRoutes {
        async fn fetch(&self, _: &InstanceConfig) -> Result<Vec<FetchedRoute>, FetchError> {
            Ok(Vec::new())
        }
    }

    struct Panics;

    #[async_trait]
    impl RouteFetcher for Panics {
        async fn fetch(&self, _: &InstanceConfig) -> Result<Vec<FetchedRoute>, FetchError> {
            panic!("fetcher exploded");
        }
    }

    fn config(poll_interval: &str) -> ProviderConfig {
        ProviderConfig {
            poll_interval: poll_interval.into(),
            ..ProviderConfig::default()
        }
    }

    fn provider(poll_interval: &str) -> Provider {
        Provider::with_fetcher(config(poll_interval), "test", Arc::new(NoRoutes)).unwrap()
    }

    #[test]
    fn new_rejects_unparseable_interval() {
        let err = Provider::with_fetcher(config("often"), "test", Arc::new(NoRoutes)).unwrap_err();
        assert!(matches!(
            err,
            RouteSyncError::InvalidDuration {
                field: "pollInterval",
                ..
            }
        ));
    }

    #[test]
    fn new_rejects_out_of_range_interval() {
        let cfg = config("170141183460469231731687303715.999999999s");
        let err = Provider::with_fetcher(cfg, "test", Arc::new(NoRoutes)).unwrap_err();
        match err {
            RouteSyncError::InvalidDuration { field, reason, .. } => {
                assert_eq!(field, "pollInterval");
                assert!(reason.contains("out of range"));
            }
            other => panic!("expected InvalidDuration, got {other:?}"),
        }
    }

    #[test]
    fn new_rejects_non_positive_fetch_timeout() {
        let cfg = ProviderConfig {
            fetch_timeout: "0s".into(),
            ..ProviderConfig::default()
        };
        let err = Provider::new(cfg, "test").unwrap_err();
        assert!(matches!(
            err,
            RouteSyncError::NonPositiveDuration {
                field: "fetchTimeout",
                ..
            }
        ));
    }

    #[test]
    fn init_accepts_positive_intervals() {
        for interval in ["1ns", "1ms", "5s", "1h"] {
            assert!(provider(interval).init().is_ok(), "rejected {interval}");
        }
    }

    #[test]
    fn init_rejects_zero_and_negative_intervals() {
        for interval in ["0", "0s", "-1s", "-5m"] {
            let p = provider(interval);
            assert!(
                matches!(
                    p.init(),
                    Err(RouteSyncError::NonPositiveDuration { .. })
                ),
                "accepted {interval}"
            );
        }
    }

    #[tokio::test]
    async fn provide_with_zero_interval_never_starts() {
        let mut p = provider("0s");
        let (tx, _rx) = mpsc::channel(1);
        assert!(p.provide(tx).is_err());
        assert_eq!(p.state(), ProviderState::Idle);
        assert!(p.task.is_none());
    }

    #[tokio::test]
    async fn lifecycle_transitions() {
        let mut p = provider("1h");
        assert_eq!(p.state(), ProviderState::Idle);

        let (tx, _rx) = mpsc::channel(1);
        p.provide(tx).unwrap();
        assert_eq!(p.state(), ProviderState::Running);

        p.stop().unwrap();
        assert_eq!(p.state(), ProviderState::Stopped);
        p.wait().await;
    }

    #[tokio::test]
    async fn provide_twice_fails() {
        let mut p = provider("1h");
        let (tx, _rx) = mpsc::channel(1);
        p.provide(tx.clone()).unwrap();
        assert!(matches!(
            p.provide(tx),
            Err(RouteSyncError::InvalidState { .. })
        ));
        p.stop().unwrap();
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut p = provider("1h");
        p.stop().unwrap();
        p.stop().unwrap();
        assert_eq!(p.state(), ProviderState::Stopped);

        let (tx, _rx) = mpsc::channel(1);
        assert!(p.provide(tx).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn first_snapshot_arrives_after_one_interval() {
        let mut p = provider("10s");
        let (tx, mut rx) = mpsc::channel(1);
        let started = Instant::now();
        p.provide(tx).unwrap();

        let snapshot = rx.recv().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(snapshot, Configuration::empty());

        p.stop().unwrap();
        p.wait().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_unblocks_pending_send() {
        let mut p = provider("1s");
        // Nobody reads: the second snapshot blocks in send() until stop.
        let (tx, mut rx) = mpsc::channel(1);
        p.provide(tx).unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        p.stop().unwrap();
        tokio::time::timeout(Duration::from_secs(1), p.wait())
            .await
            .expect("poll loop did not observe cancellation");

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_ends_loop() {
        let mut p = provider("1s");
        let (tx, rx) = mpsc::channel(1);
        p.provide(tx).unwrap();
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), p.wait())
            .await
            .expect("poll loop kept running without a receiver");
    }

    #[tokio::test(start_paused = true)]
    async fn panic_in_poll_loop_is_contained() {
        let mut cfg = config("1s");
        cfg.instances
            .insert("boom", InstanceConfig::new("http://boom:8080"));
        let mut p = Provider::with_fetcher(cfg, "test", Arc::new(Panics)).unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        p.provide(tx).unwrap();

        // The sender is dropped during unwinding, so the channel closes.
        assert!(rx.recv().await.is_none());
        p.wait().await;
    }

    #[test]
    fn state_display() {
        assert_eq!(ProviderState::Idle.to_string(), "idle");
        assert_eq!(ProviderState::Running.to_string(), "running");
        assert_eq!(ProviderState::Stopped.to_string(), "stopped");
    }
}
