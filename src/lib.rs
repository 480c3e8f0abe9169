//! Request correlation and redacted exchange logging for HTTP services.

pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redaction;
pub mod services;

pub use config::ServiceConfig;
pub use context::{ContextPropagator, RequestContext};
pub use http::{HttpServer, OutboundHeaderForwarder};
pub use lifecycle::Shutdown;
pub use redaction::RedactionPipeline;
