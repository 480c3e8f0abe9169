//! Exchange logging: exclusion check, redaction, emission.

use std::sync::Arc;

use crate::config::LogbookConfig;
use crate::context::ContextPropagator;
use crate::http::exchange::HttpExchange;
use crate::observability::exclusion::{ExclusionError, PathExclusions};
use crate::observability::metrics;
use crate::observability::sink::{LogRecord, LogSink};
use crate::redaction::{RedactionError, RedactionPipeline};

#[derive(Debug, thiserror::Error)]
pub enum ExchangeLogError {
    #[error(transparent)]
    Exclusion(#[from] ExclusionError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),
}

/// Shared by the inbound middleware and the outbound client.
#[derive(Debug, Clone)]
pub struct ExchangeLogger {
    exclusions: Arc<PathExclusions>,
    pipeline: Arc<RedactionPipeline>,
    sink: Arc<dyn LogSink>,
    max_body_bytes: usize,
}

impl ExchangeLogger {
    pub fn new(
        exclusions: PathExclusions,
        pipeline: RedactionPipeline,
        sink: Arc<dyn LogSink>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            exclusions: Arc::new(exclusions),
            pipeline: Arc::new(pipeline),
            sink,
            max_body_bytes,
        }
    }

    pub fn from_config(config: &LogbookConfig, sink: Arc<dyn LogSink>) -> Result<Self, ExchangeLogError> {
        Ok(Self::new(
            PathExclusions::with_patterns(&config.exclude)?,
            RedactionPipeline::from_config(&config.obfuscate)?,
            sink,
            config.max_body_bytes,
        ))
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.is_excluded(path)
    }

    /// Largest body buffered for logging.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn pipeline(&self) -> &RedactionPipeline {
        &self.pipeline
    }

    /// Redact and emit `exchange`. Returns false if the path is excluded.
    pub fn log(&self, exchange: &HttpExchange) -> bool {
        if self.is_excluded(exchange.path()) {
            metrics::record_excluded(exchange.origin);
            return false;
        }

        let redacted = self.pipeline.redact(exchange);
        if redacted.body_parse_failed() {
            metrics::record_body_parse_failure(exchange.origin);
        }

        for record in LogRecord::from_exchange(&redacted, ContextPropagator::correlation_id()) {
            metrics::record_exchange(record.origin, record.direction);
            self.sink.emit(record);
        }
        true
    }
}
