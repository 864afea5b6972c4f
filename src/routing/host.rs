//! Host extraction from inbound requests.

use axum::http::{header, Request};

use crate::error::ProxyError;

/// Host the client addressed, as sent (port included).
///
/// Reads the `Host` header and falls back to the URI authority, which is
/// where HTTP/2 clients put it.
pub fn request_host<B>(req: &Request<B>) -> Result<&str, ProxyError> {
    if let Some(value) = req.headers().get(header::HOST) {
        return value
            .to_str()
            .map_err(|_| ProxyError::MalformedHost("Host header is not visible ASCII".into()));
    }

    req.uri()
        .authority()
        .map(|authority| authority.as_str())
        .ok_or_else(|| ProxyError::MalformedHost("missing Host header".into()))
}

/// Strip a port suffix by splitting on the first colon.
pub fn strip_port(host: &str) -> &str {
    match host.split_once(':') {
        Some((name, _)) => name,
        None => host,
    }
}
