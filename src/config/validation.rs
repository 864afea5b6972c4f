//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every backend URL and policy pattern is usable
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate virtual hosts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::policy::PatternList;
use crate::routing::BackendAddress;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    match &config.listener.tls {
        None => errors.push(ValidationError::new(
            "listener.tls",
            "certificate and key are required",
        )),
        Some(tls) => {
            if tls.cert_path.is_empty() {
                errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
            }
            if tls.key_path.is_empty() {
                errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
            }
        }
    }

    if config.virtual_hosts.is_empty() {
        errors.push(ValidationError::new(
            "virtual_hosts",
            "at least one virtual host is required",
        ));
    }

    let mut seen = HashSet::new();
    for (i, entry) in config.virtual_hosts.iter().enumerate() {
        let field = format!("virtual_hosts[{i}]");
        if entry.host.is_empty() {
            errors.push(ValidationError::new(format!("{field}.host"), "must not be empty"));
        } else if entry.host.contains(':') {
            errors.push(ValidationError::new(
                format!("{field}.host"),
                "must not carry a port (ports are stripped before lookup)",
            ));
        } else if !seen.insert(entry.host.to_ascii_lowercase()) {
            errors.push(ValidationError::new(
                format!("{field}.host"),
                format!("duplicate virtual host {:?}", entry.host),
            ));
        }

        if let Err(e) = BackendAddress::parse(&entry.backend) {
            errors.push(ValidationError::new(format!("{field}.backend"), e.to_string()));
        }
    }

    if let Err(e) = PatternList::parse(&config.policy.reject_paths) {
        errors.push(ValidationError::new("policy.reject_paths", e.to_string()));
    }
    if let Err(e) = PatternList::parse(&config.policy.accept_paths) {
        errors.push(ValidationError::new("policy.accept_paths", e.to_string()));
    }

    let upstream = &config.upstream;
    for (field, value) in [
        ("upstream.connect_timeout_secs", upstream.connect_timeout_secs),
        ("upstream.response_timeout_secs", upstream.response_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }
    if matches!(&upstream.ca_path, Some(path) if path.is_empty()) {
        errors.push(ValidationError::new("upstream.ca_path", "must not be empty when set"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "{:?} is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
