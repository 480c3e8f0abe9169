//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound middleware / outbound client
//!     → exchange_log.rs (exclusion check first, then redaction)
//!     → sink.rs (one LogRecord per direction → LogSink)
//!
//! All subsystems produce:
//!     → logging.rs (structured log events, request span fields)
//!     → metrics.rs (counters, optional Prometheus endpoint)
//! ```
//!
//! # Design Decisions
//! - Excluded paths are dropped before any buffering or redaction
//! - Exchange records are emitted under their own tracing target
//! - Metrics are cheap (atomic increments)

pub mod exchange_log;
pub mod exclusion;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use exchange_log::{ExchangeLogError, ExchangeLogger};
pub use exclusion::{ExclusionError, PathExclusions, PathPattern};
pub use sink::{Direction, LogRecord, LogSink, MemorySink, TracingSink};
