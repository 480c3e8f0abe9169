//! Buffered HTTP exchanges.
//!
//! Both inbound requests served by this process and outbound calls it makes
//! are captured in the same shape so one redaction pipeline and one sink
//! handle both.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, request, HeaderMap, Method, StatusCode, Uri};
use serde::Serialize;

/// Which side of the wire the exchange was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// A request served by this process.
    Local,
    /// A call this process made to another service.
    Remote,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::Remote => "remote",
        }
    }
}

/// The request half of an exchange.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// The body was not captured in full and is left out of the record.
    pub body_truncated: bool,
}

impl ExchangeRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body,
            body_truncated: false,
        }
    }

    pub fn from_parts(parts: &request::Parts, body: Bytes) -> Self {
        Self::new(parts.method.clone(), &parts.uri, parts.headers.clone(), body)
    }

    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }
}

/// The response half of an exchange.
#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub body_truncated: bool,
    pub duration: Duration,
}

impl ExchangeResponse {
    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }
}

/// One request and, when the call completed, its response.
#[derive(Debug, Clone)]
pub struct HttpExchange {
    pub origin: Origin,
    pub request: ExchangeRequest,
    pub response: Option<ExchangeResponse>,
}

impl HttpExchange {
    pub fn path(&self) -> &str {
        &self.request.path
    }
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
}
