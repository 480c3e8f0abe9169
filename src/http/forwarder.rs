//! Projection of the inbound request onto outbound calls.
//!
//! # Responsibilities
//! - Copy every inbound `x-` header onto an outgoing request
//! - Stamp the live correlation id on every outgoing request
//!
//! # Design Decisions
//! - The inbound snapshot is read from the request scope, not passed around
//! - Copied headers replace any value the caller already set
//! - The correlation id is written last so it always wins

use axum::http::{HeaderMap, HeaderValue};

use crate::context::ContextPropagator;
use crate::http::request::{CORRELATION_HEADER, FORWARDED_PREFIX};

#[derive(Debug, Clone)]
pub struct OutboundHeaderForwarder {
    prefix: String,
}

impl Default for OutboundHeaderForwarder {
    fn default() -> Self {
        Self::with_prefix(FORWARDED_PREFIX)
    }
}

impl OutboundHeaderForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header names are stored lowercase, so the prefix is normalized too.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_ascii_lowercase(),
        }
    }

    /// Mutate `headers` of an outgoing request.
    ///
    /// Outside a request scope (background work) only the correlation id is
    /// set, and only if one is present.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(inbound) = ContextPropagator::inbound_headers() {
            for name in inbound.names_with_prefix(&self.prefix) {
                headers.remove(name);
                for value in inbound.get_all(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        if let Some(correlation_id) = ContextPropagator::correlation_id() {
            match HeaderValue::from_str(&correlation_id) {
                Ok(value) => {
                    headers.insert(CORRELATION_HEADER, value);
                }
                Err(e) => tracing::warn!(error = %e, "Correlation id is not a valid header value"),
            }
        }
    }
}
