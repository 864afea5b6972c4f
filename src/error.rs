//! Error types for the proxy.
//!
//! Request-time failures ([`ProxyError`]) are rendered by the outermost
//! adapter as plain HTTP errors. Policy denials are not errors: the path
//! filter turns them into a status envelope response at its own boundary.
//! [`StartupError`] covers everything that must abort before the listener
//! accepts its first connection.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::config::loader::ConfigError;

/// Failure produced by a pipeline stage while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The virtual host has no backend. A configuration gap, not a client
    /// path violation.
    #[error("no backend configured for host {host:?}")]
    NoBackend { host: String },

    #[error("malformed host: {0}")]
    MalformedHost(String),

    #[error("invalid upstream uri: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUriParts),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),

    #[error("upstream request timed out after {0:?}")]
    UpstreamTimeout(Duration),
}

impl ProxyError {
    /// HTTP status returned to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoBackend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::MalformedHost(_) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidUri(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::NoBackend { .. } => "routing",
            ProxyError::MalformedHost(_) => "malformed_host",
            ProxyError::InvalidUri(_) => "invalid_uri",
            ProxyError::Upstream(_) => "network",
            ProxyError::UpstreamTimeout(_) => "timeout",
        }
    }

    /// Whether the failure is a configuration defect rather than an
    /// environmental one.
    pub fn is_routing(&self) -> bool {
        matches!(self, ProxyError::NoBackend { .. })
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Upstream causes stay in the logs.
        let body = match &self {
            ProxyError::Upstream(_) => "upstream request failed\n".to_string(),
            other => format!("{}\n", other),
        };
        (status, body).into_response()
    }
}

/// Fatal failure while assembling the proxy.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid path pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid backend {url:?}: {reason}")]
    Backend { url: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("TLS configuration rejected: {0}")]
    Rustls(#[from] rustls::Error),

    #[error("metrics exporter: {0}")]
    Metrics(String),

    #[error("logging: {0}")]
    Logging(String),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StartupError {
    pub fn tls(msg: impl Into<String>) -> Self {
        StartupError::Tls(msg.into())
    }

    pub fn backend(url: impl Into<String>, reason: impl Into<String>) -> Self {
        StartupError::Backend {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
