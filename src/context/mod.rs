//! Per-request context subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → http::middleware::correlation (resolve correlation id + platform)
//!     → headers.rs (immutable HeaderSet snapshot)
//!     → propagator.rs (task-local scope for the rest of the request)
//!
//! While the request is served:
//!     handler code        → ContextPropagator::get/set
//!     outbound forwarder  → ContextPropagator::inbound_headers + correlation_id
//!     exchange logging    → ContextPropagator::correlation_id
//! ```
//!
//! # Design Decisions
//! - Storage is task-local, never a shared map: concurrent requests cannot
//!   observe each other's entries
//! - Entries are cleared when the scope ends, on every exit path
//! - Code running outside a request (spawned tasks, background jobs) sees an
//!   empty context and degrades to no-ops

pub mod headers;
pub mod propagator;

pub use headers::HeaderSet;
pub use propagator::{ContextGuard, ContextPropagator, RequestContext, CORRELATION_ID_KEY, PLATFORM_KEY};
