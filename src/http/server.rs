//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the selected service
//! - Wire up middleware in a fixed order (correlation, tracing, exchange log, timeout)
//! - Bind server to listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::middleware::{correlation_middleware, exchange_log_middleware};
use crate::observability::{ExchangeLogError, ExchangeLogger, LogSink};
use crate::services::{self, ServiceRole};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("exchange logging: {0}")]
    ExchangeLog(#[from] ExchangeLogError),

    #[error("profile_service.url: {0}")]
    ProfileUrl(#[from] url::ParseError),
}

/// HTTP server for one service.
pub struct HttpServer {
    router: Router,
    role: ServiceRole,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: &ServiceConfig,
        role: ServiceRole,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, StartupError> {
        let logger = ExchangeLogger::from_config(&config.logbook, sink)?;
        let routes = services::routes(role, config, logger.clone())?;
        let router = build_router(routes, logger, Duration::from_secs(config.timeouts.request_secs));
        Ok(Self { router, role })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = self.role.as_str(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn role(&self) -> ServiceRole {
        self.role
    }

    /// The fully layered router, for in-process use.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Wrap `routes` with the middleware stack. The last layer added is the
/// outermost, so the correlation scope encloses everything else.
#[allow(deprecated)]
pub fn build_router(routes: Router, logger: ExchangeLogger, request_timeout: Duration) -> Router {
    routes
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn_with_state(logger, exchange_log_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(correlation_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::observability::MemorySink;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_has_correlation_but_no_record() {
        let sink = Arc::new(MemorySink::new());
        let config = ServiceConfig::default();
        let router = HttpServer::new(&config, ServiceRole::Profile, sink.clone())
            .unwrap()
            .into_router();

        let response = router
            .oneshot(Request::get("/actuator/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-correlation-id"));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_logged_records_carry_request_correlation_id() {
        let sink = Arc::new(MemorySink::new());
        let config = ServiceConfig::default();
        let router = HttpServer::new(&config, ServiceRole::Profile, sink.clone())
            .unwrap()
            .into_router();

        let response = router
            .oneshot(
                Request::get("/api/addresses/count")
                    .header("x-datadog-trace-id", "dd-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-correlation-id"], "dd-42");

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.correlation_id.as_deref() == Some("dd-42")));
    }

    #[test]
    fn test_startup_errors() {
        let config = parse_config("[logbook]\nexclude = [\"/ok/**\"]\n").unwrap();
        assert!(HttpServer::new(&config, ServiceRole::Profile, Arc::new(MemorySink::new())).is_ok());

        let mut config = ServiceConfig::default();
        config
            .logbook
            .obfuscate
            .body_fields_json_path
            .insert("$.card".into(), vec!["(".into()]);
        assert!(matches!(
            HttpServer::new(&config, ServiceRole::Profile, Arc::new(MemorySink::new())),
            Err(StartupError::ExchangeLog(_))
        ));

        let mut config = ServiceConfig::default();
        config.profile_service.url = "not a url".into();
        assert!(matches!(
            HttpServer::new(&config, ServiceRole::User, Arc::new(MemorySink::new())),
            Err(StartupError::ProfileUrl(_))
        ));
    }
}
