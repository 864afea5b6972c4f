//! Denial responses for rejected paths.

use std::fmt;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::policy::Verdict;
use crate::status::envelope::{StatusEncoder, REASON_FORBIDDEN};

/// Which rule rejected the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    DenyListMatch,
    NotInAllowList,
}

impl DenialReason {
    /// The denial carried by a verdict, if any.
    pub fn from_verdict(verdict: Verdict) -> Option<Self> {
        match verdict {
            Verdict::Allow => None,
            Verdict::RejectedByDenyList => Some(DenialReason::DenyListMatch),
            Verdict::RejectedByAllowList => Some(DenialReason::NotInAllowList),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DenialReason::DenyListMatch => "given path forbidden by secure proxy",
            DenialReason::NotInAllowList => "given path is not allowed by secure proxy",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::DenyListMatch => write!(f, "deny_list"),
            DenialReason::NotInAllowList => write!(f, "not_in_allow_list"),
        }
    }
}

/// Response extension marking a proxy-generated denial.
///
/// Lets outer stages tell it apart from a 403 returned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDenial(pub DenialReason);

/// Synthesizes 403 status responses in place of a backend round trip.
#[derive(Debug, Clone, Default)]
pub struct DenialResponder {
    encoder: StatusEncoder,
}

impl DenialResponder {
    pub fn new(encoder: StatusEncoder) -> Self {
        Self { encoder }
    }

    pub fn respond(&self, reason: DenialReason) -> Response<Body> {
        let status = self
            .encoder
            .failure(reason.message(), REASON_FORBIDDEN, StatusCode::FORBIDDEN);

        let mut response = match self.encoder.encode(&status) {
            Ok(body) => (
                StatusCode::FORBIDDEN,
                [(header::CONTENT_TYPE, self.encoder.content_type())],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode status envelope");
                (StatusCode::FORBIDDEN, reason.message()).into_response()
            }
        };
        response.extensions_mut().insert(PolicyDenial(reason));
        response
    }
}
