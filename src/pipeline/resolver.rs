//! Virtual host resolution stage.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::uri::PathAndQuery;
use axum::http::{Request, Response, Uri};
use tower::{Layer, Service};

use crate::error::ProxyError;
use crate::pipeline::ProxyFuture;
use crate::routing::{request_host, strip_port, Backend, BackendAddress};

/// Adds a [`BackendResolver`] in front of a service.
#[derive(Debug, Clone)]
pub struct BackendResolverLayer {
    backends: Arc<dyn Backend>,
}

impl BackendResolverLayer {
    pub fn new(backends: Arc<dyn Backend>) -> Self {
        Self { backends }
    }
}

impl<S> Layer<S> for BackendResolverLayer {
    type Service = BackendResolver<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BackendResolver {
            inner,
            backends: self.backends.clone(),
        }
    }
}

/// Points the request at the backend registered for its virtual host.
///
/// Only scheme and authority change. Path, query, headers and body are
/// passed on untouched.
#[derive(Debug, Clone)]
pub struct BackendResolver<S> {
    inner: S,
    backends: Arc<dyn Backend>,
}

impl<S> BackendResolver<S> {
    fn route(&self, req: &mut Request<Body>) -> Result<BackendAddress, ProxyError> {
        let host = strip_port(request_host(req)?).to_string();
        let backend = self
            .backends
            .lookup(&host)
            .ok_or(ProxyError::NoBackend { host })?;

        let mut parts = std::mem::take(req.uri_mut()).into_parts();
        parts.scheme = Some(backend.scheme().clone());
        parts.authority = Some(backend.authority().clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        *req.uri_mut() = Uri::from_parts(parts)?;

        Ok(backend)
    }
}

impl<S> Service<Request<Body>> for BackendResolver<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        match self.route(&mut req) {
            Ok(backend) => {
                tracing::trace!(%backend, "Resolved backend");
                Box::pin(self.inner.call(req))
            }
            Err(e) => Box::pin(async move { Err(e) }),
        }
    }
}
