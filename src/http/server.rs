//! HTTP server setup.
//!
//! # Responsibilities
//! - Mount the composed pipeline as the only handler of an axum Router
//! - Turn request-time `ProxyError`s into plain HTTP error responses
//! - Serve over TLS and drain in-flight requests on shutdown

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tower::{Service, ServiceExt};

use crate::error::ProxyError;
use crate::lifecycle::ShutdownSignal;

/// Build the Axum router around a pipeline. Every method and path goes to
/// the pipeline; axum does no routing of its own.
pub fn router<S>(pipeline: S) -> Router
where
    S: Service<Request<Body>, Response = Response<Body>, Error = ProxyError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    Router::new().fallback(move |req: Request<Body>| {
        let pipeline = pipeline.clone();
        async move { render(pipeline.oneshot(req).await) }
    })
}

/// Outermost adapter: errors become responses, responses pass through.
pub fn render(result: Result<Response<Body>, ProxyError>) -> Response<Body> {
    match result {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// HTTPS front end of the proxy.
pub struct ProxyServer {
    app: Router,
    tls: RustlsConfig,
    bind_address: SocketAddr,
    grace_period: Duration,
    handle: Handle,
}

impl ProxyServer {
    pub fn new(app: Router, tls: RustlsConfig, bind_address: SocketAddr, grace_period: Duration) -> Self {
        Self {
            app,
            tls,
            bind_address,
            grace_period,
            handle: Handle::new(),
        }
    }

    /// Handle for querying the bound address (`listening().await`).
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Serve until a shutdown signal arrives, then drain for at most the
    /// grace period.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> io::Result<()> {
        tracing::info!(
            address = %self.bind_address,
            grace_period_secs = self.grace_period.as_secs(),
            "HTTPS server starting"
        );

        let handle = self.handle.clone();
        let grace = self.grace_period;
        tokio::spawn(async move {
            shutdown.recv().await;
            tracing::info!(connections = handle.connection_count(), "Draining connections");
            handle.graceful_shutdown(Some(grace));
        });

        axum_server::bind_rustls(self.bind_address, self.tls)
            .handle(self.handle)
            .serve(self.app.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}
