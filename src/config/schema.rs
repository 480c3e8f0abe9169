//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Root configuration for a service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// HTTP exchange logging and redaction.
    pub logbook: LogbookConfig,

    /// Downstream profile service used by the user service.
    pub profile_service: ProfileServiceConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for inbound and outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound request timeout in seconds.
    pub request_secs: u64,

    /// Deadline for a single outbound call in seconds.
    pub outbound_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            outbound_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// HTTP exchange logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogbookConfig {
    /// Values to redact before an exchange is logged.
    pub obfuscate: ObfuscateConfig,

    /// Extra path patterns never logged, on top of `/management/**` and
    /// `/actuator/**`.
    pub exclude: Vec<String>,

    /// Largest body captured for logging, in bytes. Larger bodies are still
    /// delivered and are left out of the record.
    pub max_body_bytes: usize,
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            obfuscate: ObfuscateConfig::default(),
            exclude: Vec::new(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Redaction rules. Everything here is added to the built-in rules.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ObfuscateConfig {
    /// Header names (case-insensitive).
    pub headers: BTreeSet<String>,

    /// Query parameter names (exact).
    pub parameters: BTreeSet<String>,

    /// JSON property names redacted at any depth.
    pub body_fields: BTreeSet<String>,

    /// Path expression (e.g. `user.notes` or `$.items[*].card`) to the regex
    /// patterns whose matches are replaced inside the selected values.
    pub body_fields_json_path: BTreeMap<String, Vec<String>>,
}

/// Profile service client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileServiceConfig {
    /// Base URL of the profile service.
    pub url: String,
}

impl Default for ProfileServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8081".to_string(),
        }
    }
}
