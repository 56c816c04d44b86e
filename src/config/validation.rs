//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that the OAuth explorer can be described (client id, discovery source)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.version.trim().is_empty() {
        errors.push(ValidationError::new("version", "must not be empty"));
    }

    if config.server.port == Some(0) {
        errors.push(ValidationError::new("server.port", "must be non-zero"));
    }

    if let Some(host) = &config.server.host {
        if host.trim().is_empty() {
            errors.push(ValidationError::new("server.host", "must not be empty when set"));
        }
    }

    check_http_url(&mut errors, "server.domain_url", &config.server.domain_url);

    if config.auth.client_id.trim().is_empty() {
        errors.push(ValidationError::new("auth.client_id", "must not be empty"));
    }

    match config.auth.discovery_endpoint() {
        Some(endpoint) => check_http_url(&mut errors, "auth.issuer", &endpoint),
        None => errors.push(ValidationError::new(
            "auth.issuer",
            "either auth.issuer or auth.discovery_url is required",
        )),
    }

    if config.lifecycle.discovery_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "lifecycle.discovery_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.security.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "security.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be greater than zero",
        ));
    }

    check_http_url(&mut errors, "docs.asset_base_url", &config.docs.asset_base_url);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported URL '{}'", url),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.version = "1.2.0".into();
        config.server.domain_url = "https://api.example.com".into();
        config.auth.client_id = "abc".into();
        config.auth.issuer = Some("https://id.example.com".into());
        config
    }

    #[test]
    fn accepts_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = valid();
        config.version.clear();
        config.server.port = Some(0);
        config.auth.client_id = " ".into();
        config.server.domain_url = "not a url".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["version", "server.port", "server.domain_url", "auth.client_id"]
        );
    }

    #[test]
    fn requires_discovery_source() {
        let mut config = valid();
        config.auth.issuer = None;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "auth.issuer");
    }

    #[test]
    fn rejects_non_http_domain() {
        let mut config = valid();
        config.server.domain_url = "ftp://files.example.com".into();
        assert!(validate_config(&config).is_err());
    }
}
