//! Log records and the sinks that receive them.
//!
//! # Responsibilities
//! - Shape a redacted exchange into one record per direction
//! - Emit records through `tracing` (production) or keep them in memory (tests)
//!
//! # Design Decisions
//! - Records are built only from [`RedactedExchange`], so nothing unredacted
//!   can reach a sink
//! - Sinks are trait objects shared behind `Arc`

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::http::exchange::Origin;
use crate::redaction::RedactedExchange;

/// Tracing target used for exchange records.
pub const EXCHANGE_TARGET: &str = "http_exchange";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

/// Structured view of one half of an exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub origin: Origin,
    #[serde(rename = "type")]
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub method: String,
    /// Path plus the redacted query string.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub body_parse_failed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub body_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl LogRecord {
    /// The request record and, if the exchange completed, the response record.
    pub fn from_exchange(exchange: &RedactedExchange, correlation_id: Option<String>) -> Vec<Self> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let request = &exchange.request;
        let uri = request.uri();

        let mut records = vec![LogRecord {
            timestamp: timestamp.clone(),
            origin: exchange.origin,
            direction: Direction::Request,
            correlation_id: correlation_id.clone(),
            method: request.method.clone(),
            path: uri.clone(),
            status: None,
            headers: request.headers.clone(),
            body: request.body.to_value(),
            body_parse_failed: request.body.parse_failed(),
            body_truncated: request.body.omitted(),
            duration_ms: None,
        }];

        if let Some(response) = &exchange.response {
            records.push(LogRecord {
                timestamp,
                origin: exchange.origin,
                direction: Direction::Response,
                correlation_id,
                method: request.method.clone(),
                path: uri,
                status: Some(response.status),
                headers: response.headers.clone(),
                body: response.body.to_value(),
                body_parse_failed: response.body.parse_failed(),
                body_truncated: response.body.omitted(),
                duration_ms: Some(response.duration.as_millis() as u64),
            });
        }

        records
    }
}

/// Destination for exchange records.
pub trait LogSink: Send + Sync + std::fmt::Debug {
    fn emit(&self, record: LogRecord);
}

/// Writes each record as one JSON document through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: LogRecord) {
        match serde_json::to_string(&record) {
            Ok(document) => tracing::info!(
                target: EXCHANGE_TARGET,
                origin = record.origin.as_str(),
                direction = record.direction.as_str(),
                "{document}"
            ),
            Err(e) => tracing::warn!(
                target: EXCHANGE_TARGET,
                error = %e,
                path = %record.path,
                "Failed to serialize exchange record"
            ),
        }
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().expect("memory sink mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("memory sink mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.lock().expect("memory sink mutex poisoned").clear();
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: LogRecord) {
        self.records
            .lock()
            .expect("memory sink mutex poisoned")
            .push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redaction::{RedactedBody, RedactedRequest, RedactedResponse};
    use serde_json::json;
    use std::time::Duration;

    fn exchange(response: bool) -> RedactedExchange {
        RedactedExchange {
            origin: Origin::Remote,
            request: RedactedRequest {
                method: "GET".into(),
                path: "/api/addresses/user/7".into(),
                query: Some("access_token=XXX".into()),
                headers: BTreeMap::from([("x-foo".to_string(), vec!["bar".to_string()])]),
                body: RedactedBody::Empty,
            },
            response: response.then(|| RedactedResponse {
                status: 200,
                headers: BTreeMap::new(),
                body: RedactedBody::Unparseable("{oops".into()),
                duration: Duration::from_millis(42),
            }),
        }
    }

    #[test]
    fn test_one_record_per_direction() {
        let records = LogRecord::from_exchange(&exchange(true), Some("abc".into()));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].direction, Direction::Request);
        assert_eq!(records[0].path, "/api/addresses/user/7?access_token=XXX");
        assert_eq!(records[1].status, Some(200));
        assert_eq!(records[1].duration_ms, Some(42));
        assert!(records[1].body_parse_failed);

        assert_eq!(LogRecord::from_exchange(&exchange(false), None).len(), 1);
    }

    #[test]
    fn test_record_json_shape() {
        let records = LogRecord::from_exchange(&exchange(true), Some("abc".into()));
        let request = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(request["type"], "request");
        assert_eq!(request["origin"], "remote");
        assert_eq!(request["correlation_id"], "abc");
        assert!(request.get("status").is_none());
        assert!(request.get("body_parse_failed").is_none());

        let response = serde_json::to_value(&records[1]).unwrap();
        assert_eq!(response["body"], json!("{oops"));
        assert_eq!(response["body_parse_failed"], true);
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        for record in LogRecord::from_exchange(&exchange(true), None) {
            sink.emit(record);
        }
        assert_eq!(sink.len(), 2);
        sink.clear();
        assert!(sink.is_empty());
    }
}
