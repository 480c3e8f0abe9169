//! Outbound HTTP client.
//!
//! # Responsibilities
//! - Apply the header forwarder to every call
//! - Bound each call with the configured timeout
//! - Feed the outbound exchange through redaction and logging
//!
//! # Design Decisions
//! - Bodies are buffered on both sides so the exchange can be logged
//! - Failures are returned to the caller; forwarding and logging never fail

use std::time::{Duration, Instant};

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Request, Response, StatusCode},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::http::exchange::{ExchangeRequest, ExchangeResponse, HttpExchange, Origin};
use crate::http::forwarder::OutboundHeaderForwarder;
use crate::observability::{metrics, ExchangeLogger};

#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("invalid outbound request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    #[error("outbound request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("outbound request to {uri} timed out after {timeout:?}")]
    Timeout { uri: String, timeout: Duration },

    #[error("failed to read body: {0}")]
    Body(#[source] axum::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client used for every service-to-service call.
#[derive(Clone)]
pub struct OutboundClient {
    client: Client<HttpConnector, Body>,
    forwarder: OutboundHeaderForwarder,
    logger: ExchangeLogger,
    timeout: Duration,
}

impl OutboundClient {
    pub fn new(logger: ExchangeLogger, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            forwarder: OutboundHeaderForwarder::new(),
            logger,
            timeout,
        }
    }

    /// Send `request` and buffer the response.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Bytes>, OutboundError> {
        let (mut parts, body) = request.into_parts();
        self.forwarder.apply(&mut parts.headers);

        let body = to_bytes(body, usize::MAX).await.map_err(OutboundError::Body)?;
        let captured = ExchangeRequest::from_parts(&parts, body.clone());
        let uri = parts.uri.to_string();

        tracing::debug!(method = %parts.method, uri = %uri, "Sending outbound request");

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.timeout,
            self.client.request(Request::from_parts(parts, Body::from(body))),
        )
        .await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(uri = %uri, error = %e, "Outbound request failed");
                self.log_failure(captured);
                return Err(e.into());
            }
            Err(_) => {
                tracing::warn!(uri = %uri, timeout = ?self.timeout, "Outbound request timed out");
                self.log_failure(captured);
                return Err(OutboundError::Timeout {
                    uri,
                    timeout: self.timeout,
                });
            }
        };

        let (parts, incoming) = response.into_parts();
        let body = to_bytes(Body::new(incoming), usize::MAX)
            .await
            .map_err(OutboundError::Body)?;
        let duration = started.elapsed();

        metrics::record_outbound(parts.status.as_str());
        tracing::debug!(
            uri = %uri,
            status = %parts.status,
            duration_ms = duration.as_millis() as u64,
            "Outbound request completed"
        );

        self.logger.log(&HttpExchange {
            origin: Origin::Remote,
            request: captured,
            response: Some(ExchangeResponse {
                status: parts.status,
                headers: parts.headers.clone(),
                body: body.clone(),
                body_truncated: false,
                duration,
            }),
        });

        Ok(Response::from_parts(parts, body))
    }

    fn log_failure(&self, request: ExchangeRequest) {
        metrics::record_outbound("error");
        self.logger.log(&HttpExchange {
            origin: Origin::Remote,
            request,
            response: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogbookConfig;
    use crate::context::{ContextPropagator, HeaderSet, CORRELATION_ID_KEY};
    use crate::observability::MemorySink;
    use axum::{http::HeaderMap, routing::get, Router};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    async fn spawn_echo() -> String {
        let app = Router::new().route(
            "/echo",
            get(|headers: HeaderMap| async move {
                let mut names: Vec<String> = headers
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v.to_str().unwrap_or_default()))
                    .collect();
                names.sort();
                names.join(";")
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(sink: Arc<MemorySink>, timeout: Duration) -> OutboundClient {
        let logger = ExchangeLogger::from_config(&LogbookConfig::default(), sink).unwrap();
        OutboundClient::new(logger, timeout)
    }

    #[tokio::test]
    async fn test_forwarded_headers_reach_remote() {
        let base = spawn_echo().await;
        let sink = Arc::new(MemorySink::new());
        let client = client(sink.clone(), Duration::from_secs(5));

        let mut inbound = HeaderMap::new();
        inbound.insert("x-foo", "bar".parse().unwrap());
        inbound.insert("content-type", "application/json".parse().unwrap());

        let response = ContextPropagator::scope(Some(HeaderSet::from(inbound)), async {
            ContextPropagator::set(CORRELATION_ID_KEY, "abc");
            let request = Request::get(format!("{base}/echo")).body(Body::empty()).unwrap();
            client.send(request).await.unwrap()
        })
        .await;

        let seen = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(seen.contains("x-foo=bar"));
        assert!(seen.contains("x-correlation-id=abc"));
        assert!(!seen.contains("content-type"));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.origin == Origin::Remote));
        assert!(records.iter().all(|r| r.correlation_id.as_deref() == Some("abc")));
    }

    #[tokio::test]
    async fn test_connection_failure_is_returned() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = Arc::new(MemorySink::new());
        let request = Request::get(format!("http://{addr}/api/x")).body(Body::empty()).unwrap();
        let result = client(sink.clone(), Duration::from_secs(5)).send(request).await;
        assert!(matches!(result, Err(OutboundError::Transport(_))));
        assert_eq!(sink.len(), 1);
    }
}
