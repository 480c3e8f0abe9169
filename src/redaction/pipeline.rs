//! The redaction pipeline.
//!
//! Three independent passes over a captured exchange:
//! - headers: name sets, case-insensitive
//! - query: name sets, exact
//! - body: JSON property names at any depth, then path-expression groups;
//!   form bodies are treated like query strings
//!
//! The pipeline is immutable after construction and a pure function of
//! (rules, exchange), so one instance is shared by every request.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::http::HeaderMap;
use serde_json::Value;

use crate::config::ObfuscateConfig;
use crate::http::exchange::{ExchangeRequest, ExchangeResponse, HttpExchange, Origin};
use crate::redaction::query::redact_pairs;
use crate::redaction::rules::{
    redact_fields, JsonPathRule, NameSet, RedactionError, BASELINE_BODY_FIELDS, BASELINE_HEADERS,
    BASELINE_PARAMETERS, REPLACEMENT,
};

/// Header names to their (possibly redacted) values, sorted by name.
pub type RedactedHeaders = BTreeMap<String, Vec<String>>;

/// A body after redaction.
#[derive(Debug, Clone, PartialEq)]
pub enum RedactedBody {
    Empty,
    /// Parsed JSON with every rule applied.
    Json(Value),
    /// Form or plain-text content.
    Text(String),
    /// Declared as JSON but could not be parsed; kept as received.
    Unparseable(String),
    /// Not captured in full, so nothing is logged.
    Omitted,
}

impl RedactedBody {
    pub fn parse_failed(&self) -> bool {
        matches!(self, RedactedBody::Unparseable(_))
    }

    pub fn omitted(&self) -> bool {
        matches!(self, RedactedBody::Omitted)
    }

    /// JSON view used in log records.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            RedactedBody::Empty | RedactedBody::Omitted => None,
            RedactedBody::Json(value) => Some(value.clone()),
            RedactedBody::Text(text) | RedactedBody::Unparseable(text) => {
                Some(Value::String(text.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedactedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: RedactedHeaders,
    pub body: RedactedBody,
}

impl RedactedRequest {
    /// Path with the redacted query string, if any.
    pub fn uri(&self) -> String {
        match &self.query {
            Some(query) if !query.is_empty() => format!("{}?{}", self.path, query),
            _ => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedactedResponse {
    pub status: u16,
    pub headers: RedactedHeaders,
    pub body: RedactedBody,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedactedExchange {
    pub origin: Origin,
    pub request: RedactedRequest,
    pub response: Option<RedactedResponse>,
}

impl RedactedExchange {
    pub fn body_parse_failed(&self) -> bool {
        self.request.body.parse_failed()
            || self.response.as_ref().is_some_and(|r| r.body.parse_failed())
    }
}

enum BodyKind {
    Json,
    Form,
    Other,
}

fn classify(content_type: Option<&str>) -> BodyKind {
    let Some(content_type) = content_type else {
        return BodyKind::Other;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

/// Compiled redaction rules.
#[derive(Debug, Clone)]
pub struct RedactionPipeline {
    headers: NameSet,
    parameters: NameSet,
    body_fields: NameSet,
    json_paths: Vec<JsonPathRule>,
}

impl Default for RedactionPipeline {
    fn default() -> Self {
        Self::baseline()
    }
}

impl RedactionPipeline {
    /// Pipeline with only the built-in rules.
    pub fn baseline() -> Self {
        Self {
            headers: NameSet::case_insensitive(BASELINE_HEADERS.iter().copied()),
            parameters: NameSet::exact(BASELINE_PARAMETERS.iter().copied()),
            body_fields: NameSet::exact(BASELINE_BODY_FIELDS.iter().copied()),
            json_paths: Vec::new(),
        }
    }

    /// Built-in rules plus everything in `config`.
    pub fn from_config(config: &ObfuscateConfig) -> Result<Self, RedactionError> {
        let headers = NameSet::case_insensitive(
            BASELINE_HEADERS
                .iter()
                .map(|h| h.to_string())
                .chain(config.headers.iter().cloned()),
        );
        let parameters = NameSet::exact(
            BASELINE_PARAMETERS
                .iter()
                .map(|p| p.to_string())
                .chain(config.parameters.iter().cloned()),
        );
        let body_fields = NameSet::exact(
            BASELINE_BODY_FIELDS
                .iter()
                .map(|f| f.to_string())
                .chain(config.body_fields.iter().cloned()),
        );
        let json_paths = config
            .body_fields_json_path
            .iter()
            .map(|(label, patterns)| JsonPathRule::compile(label, patterns))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            headers = headers.len(),
            parameters = parameters.len(),
            body_fields = body_fields.len(),
            json_path_groups = json_paths.len(),
            "Redaction rules compiled"
        );

        Ok(Self {
            headers,
            parameters,
            body_fields,
            json_paths,
        })
    }

    pub fn redact_headers(&self, headers: &HeaderMap) -> RedactedHeaders {
        let mut redacted = RedactedHeaders::new();
        for (name, value) in headers {
            let value = if self.headers.contains(name.as_str()) {
                REPLACEMENT.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            redacted.entry(name.as_str().to_string()).or_default().push(value);
        }
        redacted
    }

    pub fn redact_query(&self, query: &str) -> String {
        redact_pairs(query, &self.parameters)
    }

    pub fn redact_body(&self, content_type: Option<&str>, body: &[u8]) -> RedactedBody {
        if body.is_empty() {
            return RedactedBody::Empty;
        }
        match classify(content_type) {
            BodyKind::Json => match serde_json::from_slice::<Value>(body) {
                Ok(mut document) => {
                    self.redact_document(&mut document);
                    RedactedBody::Json(document)
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Body declared as JSON could not be parsed");
                    RedactedBody::Unparseable(String::from_utf8_lossy(body).into_owned())
                }
            },
            BodyKind::Form => {
                RedactedBody::Text(redact_pairs(&String::from_utf8_lossy(body), &self.body_fields))
            }
            BodyKind::Other => RedactedBody::Text(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// Apply the body-field and path-expression rules to a parsed document.
    pub fn redact_document(&self, document: &mut Value) -> usize {
        let mut replaced = redact_fields(document, &self.body_fields);
        for rule in &self.json_paths {
            replaced += rule.apply(document);
        }
        replaced
    }

    pub fn redact(&self, exchange: &HttpExchange) -> RedactedExchange {
        RedactedExchange {
            origin: exchange.origin,
            request: self.redact_request(&exchange.request),
            response: exchange.response.as_ref().map(|r| self.redact_response(r)),
        }
    }

    fn redact_request(&self, request: &ExchangeRequest) -> RedactedRequest {
        RedactedRequest {
            method: request.method.to_string(),
            path: request.path.clone(),
            query: request.query.as_deref().map(|q| self.redact_query(q)),
            headers: self.redact_headers(&request.headers),
            body: if request.body_truncated {
                RedactedBody::Omitted
            } else {
                self.redact_body(request.content_type(), &request.body)
            },
        }
    }

    fn redact_response(&self, response: &ExchangeResponse) -> RedactedResponse {
        RedactedResponse {
            status: response.status.as_u16(),
            headers: self.redact_headers(&response.headers),
            body: if response.body_truncated {
                RedactedBody::Omitted
            } else {
                self.redact_body(response.content_type(), &response.body)
            },
            duration: response.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderValue, Method, StatusCode, Uri};
    use serde_json::json;
    use std::collections::{BTreeMap, BTreeSet};

    fn configured() -> RedactionPipeline {
        let config = ObfuscateConfig {
            headers: BTreeSet::from(["X-Api-Key".to_string()]),
            parameters: BTreeSet::from(["password".to_string()]),
            body_fields: BTreeSet::from(["password".to_string()]),
            body_fields_json_path: BTreeMap::from([(
                "user.notes".to_string(),
                vec![r"\d{4}-\d{4}-\d{4}-\d{4}".to_string()],
            )]),
        };
        RedactionPipeline::from_config(&config).unwrap()
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers
    }

    fn exchange(body: &'static str) -> HttpExchange {
        let mut headers = json_headers();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("x-api-key", HeaderValue::from_static("k-123"));
        headers.insert("x-foo", HeaderValue::from_static("bar"));
        HttpExchange {
            origin: Origin::Local,
            request: ExchangeRequest::new(
                Method::POST,
                &Uri::from_static("/api/users?password=hunter2&page=1"),
                headers,
                Bytes::from_static(body.as_bytes()),
            ),
            response: Some(ExchangeResponse {
                status: StatusCode::CREATED,
                headers: json_headers(),
                body: Bytes::from_static(br#"{"id":1,"access_token":"t0k3n"}"#),
                body_truncated: false,
                duration: Duration::from_millis(3),
            }),
        }
    }

    #[test]
    fn test_nested_body_field() {
        let pipeline = configured();
        let body = pipeline.redact_body(Some("application/json"), br#"{"user":{"password":"secret"}}"#);
        assert_eq!(body, RedactedBody::Json(json!({"user": {"password": "XXX"}})));
    }

    #[test]
    fn test_three_passes() {
        let redacted = configured().redact(&exchange(
            r#"{"user":{"name":"ann","password":"pw","notes":"card 4111-1111-1111-1111"}}"#,
        ));
        let request = &redacted.request;
        assert_eq!(request.headers["authorization"], vec!["XXX"]);
        assert_eq!(request.headers["x-api-key"], vec!["XXX"]);
        assert_eq!(request.headers["x-foo"], vec!["bar"]);
        assert_eq!(request.uri(), "/api/users?password=XXX&page=1");
        assert_eq!(
            request.body,
            RedactedBody::Json(json!({"user": {"name": "ann", "password": "XXX", "notes": "card XXX"}}))
        );

        let response = redacted.response.as_ref().unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, RedactedBody::Json(json!({"id": 1, "access_token": "XXX"})));
        assert!(!redacted.body_parse_failed());
    }

    #[test]
    fn test_baseline_cannot_be_disabled() {
        let pipeline = RedactionPipeline::from_config(&ObfuscateConfig::default()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("Proxy-Authorization", HeaderValue::from_static("Basic x"));
        assert_eq!(pipeline.redact_headers(&headers)["proxy-authorization"], vec!["XXX"]);
        assert_eq!(pipeline.redact_query("access_token=a"), "access_token=XXX");
    }

    #[test]
    fn test_redaction_is_idempotent() {
        let pipeline = configured();
        let first = pipeline.redact(&exchange(
            r#"{"password":"pw","user":{"password":"x","notes":"4111-1111-1111-1111"}}"#,
        ));

        // Feed the redacted record back through the pipeline.
        let mut headers = HeaderMap::new();
        for (name, values) in &first.request.headers {
            for value in values {
                headers.append(
                    axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                    HeaderValue::from_str(value).unwrap(),
                );
            }
        }
        let body = match &first.request.body {
            RedactedBody::Json(value) => Bytes::from(serde_json::to_vec(value).unwrap()),
            other => panic!("unexpected body {other:?}"),
        };
        let replay = HttpExchange {
            origin: Origin::Local,
            request: ExchangeRequest::new(
                Method::POST,
                &first.request.uri().parse::<Uri>().unwrap(),
                headers,
                body,
            ),
            response: None,
        };
        let second = pipeline.redact(&replay);
        assert_eq!(second.request, first.request);
    }

    #[test]
    fn test_truncated_body_is_omitted() {
        let mut partial = exchange(r#"{"password":"sec"#);
        partial.request.body_truncated = true;
        let redacted = configured().redact(&partial);
        assert_eq!(redacted.request.body, RedactedBody::Omitted);
        assert!(redacted.request.body.to_value().is_none());
        assert!(!redacted.body_parse_failed());
        assert!(redacted.response.unwrap().body.to_value().is_some());
    }

    #[test]
    fn test_malformed_json_is_kept_and_flagged() {
        let body = configured().redact_body(Some("application/json"), br#"{"password": "#);
        assert!(body.parse_failed());
        assert_eq!(body.to_value(), Some(json!(r#"{"password": "#)));
    }

    #[test]
    fn test_form_and_text_bodies() {
        let pipeline = configured();
        assert_eq!(
            pipeline.redact_body(
                Some("application/x-www-form-urlencoded; charset=utf-8"),
                b"user=ann&password=pw&refresh_token=r"
            ),
            RedactedBody::Text("user=ann&password=XXX&refresh_token=XXX".into())
        );
        assert_eq!(
            pipeline.redact_body(Some("text/plain"), b"password=pw"),
            RedactedBody::Text("password=pw".into())
        );
        assert_eq!(
            pipeline.redact_body(Some("application/problem+json"), br#"{"password":1}"#),
            RedactedBody::Json(json!({"password": "XXX"}))
        );
        assert_eq!(pipeline.redact_body(None, b""), RedactedBody::Empty);
    }
}
