//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the service URI and value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

/// Longest accepted token refresh buffer (one day).
pub const MAX_REFRESH_BUFFER_SECS: u64 = 86_400;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("endpoint.service_uri '{0}' is not a valid URL")]
    InvalidServiceUri(String),

    #[error("endpoint.service_uri must use http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("endpoint.table must be an alphanumeric name, got '{0}'")]
    InvalidTableName(String),

    #[error("endpoint.api_version must not be empty")]
    EmptyApiVersion,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("auth.header_name must not be empty")]
    EmptyAuthHeader,

    #[error("auth.refresh_buffer_secs must be at most {max}, got {0}", max = MAX_REFRESH_BUFFER_SECS)]
    RefreshBufferTooLarge(u64),

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.endpoint.service_uri) {
        Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
            errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
        }
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::InvalidServiceUri(
            config.endpoint.service_uri.clone(),
        )),
    }

    // Empty means the record type's own table name.
    let table = &config.endpoint.table;
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        errors.push(ValidationError::InvalidTableName(table.clone()));
    }

    if config.endpoint.api_version.trim().is_empty() {
        errors.push(ValidationError::EmptyApiVersion);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if config.auth.header_name.trim().is_empty() {
        errors.push(ValidationError::EmptyAuthHeader);
    }
    if config.auth.refresh_buffer_secs > MAX_REFRESH_BUFFER_SECS {
        errors.push(ValidationError::RefreshBufferTooLarge(
            config.auth.refresh_buffer_secs,
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ClientConfig::default();
        config.endpoint.service_uri = "not a url".into();
        config.endpoint.table = "todo item".into();
        config.timeouts.connect_secs = 0;
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidServiceUri("not a url".into())));
        assert!(errors.contains(&ValidationError::InvalidTableName("todo item".into())));
        assert!(errors.contains(&ValidationError::ZeroTimeout("connect_secs")));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = ClientConfig::default();
        config.endpoint.service_uri = "ftp://example.com/".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::UnsupportedScheme("ftp".into())]);
    }

    #[test]
    fn test_empty_table_is_allowed() {
        let mut config = ClientConfig::default();
        config.endpoint.table = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_refresh_buffer_is_bounded() {
        let mut config = ClientConfig::default();
        config.auth.refresh_buffer_secs = MAX_REFRESH_BUFFER_SECS;
        assert!(validate_config(&config).is_ok());

        config.auth.refresh_buffer_secs = u64::MAX / 2;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::RefreshBufferTooLarge(u64::MAX / 2)]);
    }

    #[test]
    fn test_rejects_table_with_path_characters() {
        let mut config = ClientConfig::default();
        config.endpoint.table = "todo/../admin".into();
        assert!(validate_config(&config).is_err());
    }
}
