//! The `Status` object clients of the API server expect on failure.

use axum::body::Bytes;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

pub const STATUS_FAILURE: &str = "Failure";
pub const REASON_FORBIDDEN: &str = "Forbidden";

/// Empty list metadata, serialized as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {}

/// Structured failure payload. Field order matches the API server's own output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEnvelope {
    pub kind: String,
    pub api_version: String,
    pub metadata: ListMeta,
    pub status: String,
    pub message: String,
    pub reason: String,
    pub code: u16,
}

/// Builds and serializes status envelopes for one API group version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEncoder {
    api_version: String,
}

impl StatusEncoder {
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
        }
    }

    /// Build a `Failure` envelope.
    pub fn failure(
        &self,
        message: impl Into<String>,
        reason: &str,
        code: StatusCode,
    ) -> StatusEnvelope {
        StatusEnvelope {
            kind: "Status".to_string(),
            api_version: self.api_version.clone(),
            metadata: ListMeta::default(),
            status: STATUS_FAILURE.to_string(),
            message: message.into(),
            reason: reason.to_string(),
            code: code.as_u16(),
        }
    }

    /// Serialize as newline-terminated JSON.
    pub fn encode(&self, status: &StatusEnvelope) -> Result<Bytes, serde_json::Error> {
        let mut buf = serde_json::to_vec(status)?;
        buf.push(b'\n');
        Ok(Bytes::from(buf))
    }

    pub fn content_type(&self) -> &'static str {
        "application/json"
    }
}

impl Default for StatusEncoder {
    fn default() -> Self {
        Self::new("v1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_like_the_api_server() {
        let encoder = StatusEncoder::default();
        let status = encoder.failure("nope", REASON_FORBIDDEN, StatusCode::FORBIDDEN);
        let bytes = encoder.encode(&status).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            "{\"kind\":\"Status\",\"apiVersion\":\"v1\",\"metadata\":{},\
             \"status\":\"Failure\",\"message\":\"nope\",\"reason\":\"Forbidden\",\"code\":403}\n"
        );
    }

    #[test]
    fn decodes_back() {
        let encoder = StatusEncoder::new("v1");
        let status = encoder.failure("m", REASON_FORBIDDEN, StatusCode::FORBIDDEN);
        let bytes = encoder.encode(&status).unwrap();
        let parsed: StatusEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, status);
    }
}
