//! Outbound round trip to the resolved backend.
//!
//! One pooled client is shared by all requests. Connections speak HTTP/1.1
//! over TLS 1.3 (or plain HTTP for `http://` backends) and are reused per
//! backend authority.
//!
//! A request carrying `Upgrade` that the backend answers with 101 is bridged:
//! once both sides switch protocols, bytes are copied in both directions
//! until either end closes.

use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::header::UPGRADE;
use axum::http::{Request, Response, StatusCode, Version};
use hyper::body::Incoming;
use hyper::upgrade::OnUpgrade;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use tower::Service;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::pipeline::ProxyFuture;

type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Terminal pipeline stage: sends the rewritten request to its backend.
#[derive(Clone)]
pub struct UpstreamClient {
    client: HttpsClient,
    response_timeout: Duration,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("response_timeout", &self.response_timeout)
            .finish_non_exhaustive()
    }
}

impl UpstreamClient {
    /// Build the client. `tls` must not advertise ALPN protocols; the
    /// connector only negotiates HTTP/1.1.
    pub fn new(tls: rustls::ClientConfig, config: &UpstreamConfig) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build(connector);

        Self {
            client,
            response_timeout: Duration::from_secs(config.response_timeout_secs),
        }
    }

    /// Perform the round trip. The timeout covers connect plus response
    /// headers; the body then streams without a deadline so watches stay open.
    pub async fn send(&self, mut req: Request<Body>) -> Result<Response<Body>, ProxyError> {
        *req.version_mut() = Version::HTTP_11;
        let client_upgrade = req
            .headers()
            .contains_key(UPGRADE)
            .then(|| hyper::upgrade::on(&mut req));

        let mut response: Response<Incoming> =
            tokio::time::timeout(self.response_timeout, self.client.request(req))
                .await
                .map_err(|_| ProxyError::UpstreamTimeout(self.response_timeout))?
                .map_err(ProxyError::Upstream)?;

        if let Some(client_upgrade) = client_upgrade {
            if response.status() == StatusCode::SWITCHING_PROTOCOLS {
                let backend_upgrade = hyper::upgrade::on(&mut response);
                tokio::spawn(bridge(client_upgrade, backend_upgrade));
            }
        }

        Ok(response.map(Body::new))
    }
}

/// Copy bytes between an upgraded client connection and its backend.
async fn bridge(client: OnUpgrade, backend: OnUpgrade) {
    let (client, backend) = match tokio::try_join!(client, backend) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::debug!(error = %e, "Protocol upgrade failed");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut backend = TokioIo::new(backend);
    match tokio::io::copy_bidirectional(&mut client, &mut backend).await {
        Ok((to_backend, to_client)) => {
            tracing::debug!(to_backend, to_client, "Upgraded stream closed")
        }
        Err(e) => tracing::debug!(error = %e, "Upgraded stream ended"),
    }
}

impl Service<Request<Body>> for UpstreamClient {
    type Response = Response<Body>;
    type Error = ProxyError;
    type Future = ProxyFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { this.send(req).await })
    }
}
