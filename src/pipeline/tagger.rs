//! Correlation id tagging.

use axum::http::{HeaderName, HeaderValue};
use tower_http::set_header::{MakeHeaderValue, SetRequestHeader, SetRequestHeaderLayer};
use uuid::Uuid;

/// Header carrying the per-request correlation id.
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-k8s-proxy-id");

/// Produces a fresh UUID v4 for every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationIdMaker;

impl<T> MakeHeaderValue<T> for CorrelationIdMaker {
    fn make_header_value(&mut self, _message: &T) -> Option<HeaderValue> {
        HeaderValue::try_from(Uuid::new_v4().hyphenated().to_string()).ok()
    }
}

/// Tagging stage wrapped around `S`.
pub type RequestTagger<S> = SetRequestHeader<S, CorrelationIdMaker>;

/// Layer that overwrites any client-supplied correlation id.
pub fn request_tagger_layer() -> SetRequestHeaderLayer<CorrelationIdMaker> {
    SetRequestHeaderLayer::overriding(CORRELATION_ID_HEADER, CorrelationIdMaker)
}
