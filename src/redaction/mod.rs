//! Redaction of captured HTTP exchanges.
//!
//! # Data Flow
//! ```text
//! [logbook.obfuscate] config
//!     → rules.rs (baseline ∪ configured name sets, compiled path groups)
//!     → pipeline.rs (RedactionPipeline, built once at startup)
//!
//! HttpExchange
//!     → headers pass (case-insensitive names)
//!     → query pass (query.rs, exact names)
//!     → body pass (JSON fields at any depth, json_path.rs groups, form pairs)
//!     → RedactedExchange
//! ```
//!
//! # Design Decisions
//! - Every redacted value becomes the literal [`REPLACEMENT`]
//! - Bad patterns fail configuration loading, never a request
//! - Malformed bodies are kept verbatim and flagged

pub mod json_path;
pub mod pipeline;
pub mod query;
pub mod rules;

pub use json_path::JsonPath;
pub use pipeline::{
    RedactedBody, RedactedExchange, RedactedHeaders, RedactedRequest, RedactedResponse,
    RedactionPipeline,
};
pub use rules::{JsonPathRule, NameSet, RedactionError, REPLACEMENT};
