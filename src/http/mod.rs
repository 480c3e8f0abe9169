//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound:
//!     TCP connection
//!     → server.rs (Axum setup, middleware order)
//!     → middleware/correlation.rs (request scope, X-Correlation-ID)
//!     → middleware/exchange_log.rs (buffer, redact, log)
//!     → service handlers
//!
//! Outbound (while serving a request):
//!     handler → client.rs
//!     → forwarder.rs (x-* headers + correlation id from the request scope)
//!     → remote service
//!     → exchange logging (origin = remote)
//! ```

pub mod client;
pub mod exchange;
pub mod forwarder;
pub mod middleware;
pub mod request;
pub mod server;

pub use client::{OutboundClient, OutboundError};
pub use forwarder::OutboundHeaderForwarder;
pub use request::{X_CORRELATION_ID, X_DATADOG_TRACE_ID, X_USER_PLATFORM};
pub use server::{build_router, HttpServer, StartupError};
