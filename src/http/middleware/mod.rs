//! Request-scoped middleware.
//!
//! Layer order, outermost first:
//! ```text
//! correlation   → opens the request scope, sets X-Correlation-ID
//! TraceLayer    → tower-http request/response events (inside the scope)
//! exchange_log  → buffers, redacts and logs the exchange
//! TimeoutLayer  → bounds handler time
//! ```

pub mod correlation;
pub mod exchange_log;

pub use correlation::correlation_middleware;
pub use exchange_log::exchange_log_middleware;
