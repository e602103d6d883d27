//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that URLs parse and use http(s)
//! - Validate value ranges (timeouts > 0, retry budget > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the deserialized config
//! - Runs before the config is accepted into the connector

use url::Url;

use crate::config::schema::ConnectorConfig;

/// One semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError {
            field: field.to_string(),
            message: format!("unsupported scheme {:?}", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError {
            field: field.to_string(),
            message: format!("not a valid URL: {e}"),
        }),
    }
}

/// Validate a deserialized config, collecting every problem.
pub fn validate_config(config: &ConnectorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.network_id.is_empty() {
        errors.push(ValidationError {
            field: "network.network_id".into(),
            message: "must not be empty".into(),
        });
    }
    if config.network.endpoints.is_empty() {
        errors.push(ValidationError {
            field: "network.endpoints".into(),
            message: "at least one RPC endpoint is required".into(),
        });
    }
    for (i, endpoint) in config.network.endpoints.iter().enumerate() {
        check_url(&mut errors, &format!("network.endpoints[{i}]"), endpoint);
    }
    check_url(&mut errors, "network.wallet_url", &config.network.wallet_url);
    if !config.network.app_url.is_empty() {
        check_url(&mut errors, "network.app_url", &config.network.app_url);
    }

    if config.rpc.timeout_ms == 0 {
        errors.push(ValidationError {
            field: "rpc.timeout_ms".into(),
            message: "must be greater than zero".into(),
        });
    }
    if config.rpc.tries_per_endpoint == 0 {
        errors.push(ValidationError {
            field: "rpc.tries_per_endpoint".into(),
            message: "must be greater than zero".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
