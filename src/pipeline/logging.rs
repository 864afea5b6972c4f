//! Request logging stage.
//!
//! Emits exactly one event per request after the inner chain has finished,
//! and records request metrics. The inner result is returned unchanged.

use std::error::Error as _;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Response};
use tower::{Layer, Service};

use crate::error::ProxyError;
use crate::observability::metrics;
use crate::pipeline::tagger::CORRELATION_ID_HEADER;
use crate::pipeline::ProxyFuture;
use crate::status::PolicyDenial;

/// Adds a [`Logging`] stage in front of a service.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer;

impl LoggingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging { inner }
    }
}

#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for Logging<S>
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
        let headers = req.headers();
        let record = RequestRecord {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            host: header_str(headers, &header::HOST),
            user_agent: header_str(headers, &header::USER_AGENT),
            correlation_id: header_str(headers, &CORRELATION_ID_HEADER),
            start: Instant::now(),
        };
        let future = self.inner.call(req);

        Box::pin(async move {
            let result = future.await;
            record.emit(&result);
            result
        })
    }
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

struct RequestRecord {
    method: Method,
    path: String,
    host: Option<String>,
    user_agent: Option<String>,
    correlation_id: Option<String>,
    start: Instant,
}

impl RequestRecord {
    fn emit(&self, result: &Result<Response<Body>, ProxyError>) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let correlation_id = self.correlation_id.as_deref().unwrap_or("-");
        let host = self.host.as_deref().unwrap_or("-");
        let user_agent = self.user_agent.as_deref().unwrap_or("-");

        let (status, outcome) = match result {
            Ok(response) => {
                let status = response.status();
                match response.extensions().get::<PolicyDenial>() {
                    Some(PolicyDenial(reason)) => {
                        tracing::warn!(
                            method = %self.method,
                            path = %self.path,
                            correlation_id,
                            status = status.as_u16(),
                            denial = %reason,
                            host,
                            user_agent,
                            elapsed_ms,
                            "Request denied by path policy"
                        );
                        (status, "denied")
                    }
                    None => {
                        tracing::info!(
                            method = %self.method,
                            path = %self.path,
                            correlation_id,
                            status = status.as_u16(),
                            elapsed_ms,
                            host,
                            user_agent,
                            "Request proxied"
                        );
                        (status, "proxied")
                    }
                }
            }
            Err(e) if e.is_routing() => {
                tracing::error!(
                    method = %self.method,
                    path = %self.path,
                    correlation_id,
                    host,
                    error = %e,
                    elapsed_ms,
                    "No backend for virtual host"
                );
                (e.status(), e.kind())
            }
            Err(e) => {
                tracing::warn!(
                    method = %self.method,
                    path = %self.path,
                    correlation_id,
                    error = %e,
                    cause = %cause_chain(e),
                    kind = e.kind(),
                    elapsed_ms,
                    "Request failed"
                );
                (e.status(), e.kind())
            }
        };

        metrics::record_request(&self.method, status.as_u16(), outcome, self.start);
    }
}

/// Sources of `err`, outermost first, joined with ": ".
fn cause_chain(err: &ProxyError) -> String {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    if causes.is_empty() {
        "-".to_string()
    } else {
        causes.join(": ")
    }
}
