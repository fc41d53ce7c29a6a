//! Integration tests for the snapshot server and health endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use routesync::dynamic::{Configuration, Router};
use routesync::health::HealthResponse;
use routesync::server::{self, AppState, CONFIG_VERSION_HEADER};

fn sample_configuration() -> Configuration {
    let mut configuration = Configuration::empty();
    configuration.http.routers.insert(
        "Host(`app`)".into(),
        Router {
            entry_points: vec!["websecure".into()],
            service: "edge".into(),
            rule: "Host(`app`)@docker".into(),
            tls: None,
        },
    );
    configuration.http.services.insert(
        "edge".into(),
        serde_json::json!({"loadBalancer": {"servers": [{"url": "http://edge"}]}}),
    );
    configuration
}

async fn start_test_server(
    state: Arc<AppState>,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

#[tokio::test]
async fn health_reports_starting_before_first_snapshot() {
    let state = Arc::new(AppState::new("test", "5s", 2));
    let (addr, shutdown) = start_test_server(state).await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "starting");
    assert_eq!(health.provider.name, "test");
    assert_eq!(health.provider.poll_interval, "5s");
    assert_eq!(health.provider.instances, 2);
    assert!(health.snapshot.is_none());
    assert_eq!(health.stats.snapshots_received, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn config_is_unavailable_before_first_snapshot() {
    let state = Arc::new(AppState::new("test", "5s", 0));
    let (addr, shutdown) = start_test_server(state).await;

    let resp = reqwest::get(format!("http://{addr}/api/config")).await.unwrap();
    assert_eq!(resp.status(), 503);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn published_snapshot_is_served_with_version() {
    let state = Arc::new(AppState::new("test", "5s", 1));
    let published = state
        .publish(sample_configuration())
        .await
        .unwrap()
        .unwrap();
    let (addr, shutdown) = start_test_server(Arc::clone(&state)).await;

    let resp = reqwest::get(format!("http://{addr}/api/config")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()[CONFIG_VERSION_HEADER].to_str().unwrap(),
        published.version
    );

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["http"]["routers"]["Host(`app`)"]["service"], "edge");
    assert_eq!(
        body["http"]["routers"]["Host(`app`)"]["rule"],
        "Host(`app`)@docker"
    );
    assert!(body["http"]["services"]["edge"]["loadBalancer"].is_object());
    assert!(body["tcp"].is_object());
    assert!(body["udp"].is_object());
    assert!(body["tls"].is_object());

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    let snapshot = health.snapshot.unwrap();
    assert_eq!(snapshot.routers, 1);
    assert_eq!(snapshot.services, 1);
    assert_eq!(snapshot.version, &published.version[..8]);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn identical_snapshots_are_not_republished() {
    let state = AppState::new("test", "5s", 1);

    assert!(state.publish(sample_configuration()).await.unwrap().is_some());
    assert!(state.publish(sample_configuration()).await.unwrap().is_none());
    assert!(state.publish(Configuration::empty()).await.unwrap().is_some());

    let stats = &state.stats;
    assert_eq!(stats.received.load(std::sync::atomic::Ordering::Relaxed), 3);
    assert_eq!(stats.changed.load(std::sync::atomic::Ordering::Relaxed), 2);
}

#[tokio::test]
async fn unknown_path_returns_404() {
    let state = Arc::new(AppState::new("test", "5s", 0));
    let (addr, shutdown) = start_test_server(state).await;

    let resp = reqwest::get(format!("http://{addr}/nope")).await.unwrap();
    assert_eq!(resp.status(), 404);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_stops_server() {
    let state = Arc::new(AppState::new("test", "5s", 0));
    let (addr, shutdown) = start_test_server(state).await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    shutdown.send(()).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(reqwest::get(format!("http://{addr}/health")).await.is_err());
}
