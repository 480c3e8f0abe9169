//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{http::HeaderMap, routing::get, Json, Router};
use correlate::config::ServiceConfig;
use correlate::http::HttpServer;
use correlate::lifecycle::Shutdown;
use correlate::observability::MemorySink;
use correlate::services::ServiceRole;
use tokio::net::TcpListener;

/// A service running on an ephemeral port.
pub struct RunningService {
    pub addr: SocketAddr,
    pub sink: Arc<MemorySink>,
    shutdown: Shutdown,
}

impl RunningService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start `role` with `config`, recording exchanges in memory.
pub async fn start_service(role: ServiceRole, config: ServiceConfig) -> RunningService {
    let sink = Arc::new(MemorySink::new());
    let server = HttpServer::new(&config, role, sink.clone()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningService { addr, sink, shutdown }
}

/// Start a profile-service and a user-service pointed at it.
pub async fn start_pair(mut config: ServiceConfig) -> (RunningService, RunningService) {
    let profile = start_service(ServiceRole::Profile, config.clone()).await;
    config.profile_service.url = format!("http://{}", profile.addr);
    let user = start_service(ServiceRole::User, config).await;
    (user, profile)
}

/// Headers of every request a capturing backend received.
pub type Captured = Arc<Mutex<Vec<HeaderMap>>>;

/// Stand-in profile-service that records request headers and returns `[]`.
#[allow(dead_code)]
pub async fn start_capturing_backend() -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    let handler = move |headers: HeaderMap| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(headers);
            Json(Vec::<serde_json::Value>::new())
        }
    };
    let app = Router::new()
        .route("/api/addresses/user/{user_id}", get(handler.clone()))
        .route("/api/educations/user/{user_id}", get(handler));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), captured)
}

/// Client that never reuses connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
