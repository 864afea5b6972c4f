//! Path policy stage.

use std::borrow::Cow;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use percent_encoding::percent_decode_str;
use tower::{Layer, Service};

use crate::error::ProxyError;
use crate::pipeline::ProxyFuture;
use crate::policy::PathPolicy;
use crate::status::{DenialReason, DenialResponder};

/// Adds a [`PathFilter`] in front of a service.
#[derive(Debug, Clone)]
pub struct PathFilterLayer {
    policy: Arc<PathPolicy>,
    responder: Arc<DenialResponder>,
}

impl PathFilterLayer {
    pub fn new(policy: Arc<PathPolicy>, responder: Arc<DenialResponder>) -> Self {
        Self { policy, responder }
    }
}

impl<S> Layer<S> for PathFilterLayer {
    type Service = PathFilter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PathFilter {
            inner,
            policy: self.policy.clone(),
            responder: self.responder.clone(),
        }
    }
}

/// Forwards allowed paths to the inner service; answers rejected ones with
/// a status envelope without ever calling it.
///
/// Patterns see the percent-decoded path, the same form the API server
/// routes on. A path that does not decode to UTF-8 is denied. The request
/// itself is forwarded with its original encoding.
#[derive(Debug, Clone)]
pub struct PathFilter<S> {
    inner: S,
    policy: Arc<PathPolicy>,
    responder: Arc<DenialResponder>,
}

impl<S> Service<Request<Body>> for PathFilter<S>
where
    S: Service<Request<Body>, Response = Response<Body>, Error = ProxyError>,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = ProxyError;
    type Future = ProxyFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let denial = match decode_path(req.uri().path()) {
            Some(path) => DenialReason::from_verdict(self.policy.evaluate(&path)),
            None => Some(DenialReason::NotInAllowList),
        };
        match denial {
            None => Box::pin(self.inner.call(req)),
            Some(reason) => {
                tracing::debug!(path = %req.uri().path(), %reason, "Path rejected by policy");
                let response = self.responder.respond(reason);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

fn decode_path(raw: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(raw).decode_utf8().ok()
}
