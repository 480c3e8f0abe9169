//! Correlation headers and how inbound values are resolved.
//!
//! # Responsibilities
//! - Name the headers the services exchange
//! - Resolve the correlation id (trace header or fresh UUID v4)
//! - Resolve the platform tag (upper-cased, defaulted)
//!
//! # Design Decisions
//! - Missing or blank headers default silently, never reject the request
//! - Resolution reads only the header snapshot, so it is usable from tests
//!   without a running server

use axum::http::HeaderName;
use uuid::Uuid;

use crate::context::HeaderSet;

/// Response and outbound header carrying the correlation id.
pub const X_CORRELATION_ID: &str = "X-Correlation-ID";

/// [`X_CORRELATION_ID`] in the normalized form `HeaderMap` stores.
pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Inbound trace header reused as the correlation id.
pub const X_DATADOG_TRACE_ID: &str = "x-datadog-trace-id";

/// Inbound header naming the calling platform.
pub const X_USER_PLATFORM: &str = "x-user-platform";

/// Platform used when the caller does not send one.
pub const DEFAULT_PLATFORM: &str = "POSTMAN";

/// Prefix of inbound headers copied onto outbound calls.
pub const FORWARDED_PREFIX: &str = "x-";

/// Trace header if present and non-blank, otherwise a fresh UUID v4.
///
/// An inbound `X-Correlation-ID` is not a source; only the trace header
/// carries an id across the service boundary.
pub fn resolve_correlation_id(headers: &HeaderSet) -> String {
    headers
        .get_non_empty(X_DATADOG_TRACE_ID)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Platform header upper-cased, or [`DEFAULT_PLATFORM`].
pub fn resolve_platform(headers: &HeaderSet) -> String {
    headers
        .get_non_empty(X_USER_PLATFORM)
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_PLATFORM.to_string())
}
