//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Protocol version spoken by the table endpoint.
pub const DEFAULT_API_VERSION: &str = "3.0.0";

/// Header carrying the token when no auth scheme is configured.
pub const DEFAULT_AUTH_HEADER: &str = "X-ZUMO-AUTH";

/// Root configuration for the todo service client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote table endpoint.
    pub endpoint: EndpointConfig,

    /// Transport timeouts.
    pub timeouts: TimeoutConfig,

    /// Token header settings.
    pub auth: AuthConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Where the table lives.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base address of the service (e.g., "https://example.azurewebsites.net/").
    pub service_uri: String,

    /// Table name; requests go to `tables/{table}`. Empty uses the record type's own name.
    pub table: String,

    /// Value sent as `ZUMO-API-VERSION`.
    pub api_version: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            service_uri: "http://localhost:5000/".to_string(),
            table: "todoitem".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

/// Timeout configuration for the transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Authentication header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Header used when `scheme` is unset.
    pub header_name: String,

    /// When set, the token is sent as `Authorization: {scheme} {token}`.
    pub scheme: Option<String>,

    /// Tokens expiring within this many seconds are refreshed before use.
    pub refresh_buffer_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_AUTH_HEADER.to_string(),
            scheme: None,
            refresh_buffer_secs: 120,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Write request and response bodies to the HTTP log.
    pub log_bodies: bool,

    /// Record request metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_bodies: true,
            metrics_enabled: true,
        }
    }
}
