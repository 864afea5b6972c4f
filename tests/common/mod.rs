//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::header::{CONNECTION, UPGRADE};
use axum::http::{Request, Response, StatusCode, Version};
use axum::Router;
use hyper_util::rt::TokioIo;
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

use kube_secure_proxy::config::UpstreamConfig;
use kube_secure_proxy::http::router;
use kube_secure_proxy::net::tls;
use kube_secure_proxy::pipeline::{compose, Stages, UpstreamClient, CORRELATION_ID_HEADER};
use kube_secure_proxy::policy::PathPolicy;
use kube_secure_proxy::routing::{Backend, BackendAddress, VirtualHosts};
use kube_secure_proxy::status::DenialResponder;

/// What the mock backend saw of one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub uri: String,
    pub version: Version,
    pub correlation_id: Option<String>,
    pub body: String,
}

/// A running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start a mock backend that answers `(200, "ok")`.
pub async fn start_mock_backend() -> MockBackend {
    start_programmable_backend(|| async { (200, "ok".to_string()) }).await
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let backend = MockBackend {
        addr,
        calls: Arc::new(AtomicUsize::new(0)),
        seen: Arc::new(Mutex::new(Vec::new())),
    };

    let f = Arc::new(f);
    let calls = backend.calls.clone();
    let seen = backend.seen.clone();
    let app = Router::new().fallback(move |req: Request<Body>| {
        let f = f.clone();
        let calls = calls.clone();
        let seen = seen.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let (parts, body) = req.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
            seen.lock().unwrap().push(SeenRequest {
                method: parts.method.to_string(),
                uri: parts.uri.to_string(),
                version: parts.version,
                correlation_id: parts
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                body: String::from_utf8_lossy(&body).into_owned(),
            });

            let (status, body) = f().await;
            (StatusCode::from_u16(status).unwrap(), body)
        }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    backend
}

/// Start a backend that switches protocols on every request and echoes the
/// upgraded stream back.
pub async fn start_upgrade_echo_backend() -> SocketAddr {
    let app = Router::new().fallback(|mut req: Request<Body>| async move {
        let on_upgrade = hyper::upgrade::on(&mut req);
        tokio::spawn(async move {
            if let Ok(upgraded) = on_upgrade.await {
                let (mut read, mut write) = tokio::io::split(TokioIo::new(upgraded));
                let _ = tokio::io::copy(&mut read, &mut write).await;
            }
        });
        Response::builder()
            .status(StatusCode::SWITCHING_PROTOCOLS)
            .header(CONNECTION, "Upgrade")
            .header(UPGRADE, "SPDY/3.1")
            .body(Body::empty())
            .unwrap()
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Upstream client that trusts nothing; enough for `http://` backends.
pub fn plain_upstream() -> UpstreamClient {
    let tls = tls::client_config_with_roots(rustls::RootCertStore::empty()).unwrap();
    UpstreamClient::new(tls, &UpstreamConfig::default())
}

pub fn stages(backends: Arc<dyn Backend>, reject: &str, accept: &str) -> Stages {
    Stages {
        backends,
        policy: Arc::new(PathPolicy::new(reject, accept).unwrap()),
        responder: Arc::new(DenialResponder::default()),
    }
}

/// Host map with one virtual host pointing at `backend`.
pub fn single_host(host: &str, backend: &MockBackend) -> Arc<VirtualHosts> {
    let mut hosts = VirtualHosts::new();
    hosts.insert(host, BackendAddress::parse(&backend.url()).unwrap());
    Arc::new(hosts)
}

/// Serve the full pipeline over plain HTTP on an ephemeral port.
///
/// Clients reach it as `127.0.0.1:<port>`, so `127.0.0.1` is the virtual host
/// they present.
pub async fn start_plain_proxy(stages: Stages) -> SocketAddr {
    let app = router(compose(stages, plain_upstream()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Self-signed certificate and key for `names`, written to temp files.
pub struct TlsFixture {
    pub cert_pem: String,
    pub cert: NamedTempFile,
    pub key: NamedTempFile,
}

pub fn tls_fixture(names: &[&str]) -> TlsFixture {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(names.iter().map(|n| n.to_string()).collect::<Vec<_>>())
            .unwrap();
    let cert_pem = cert.pem();
    TlsFixture {
        cert: pem_file(&cert_pem),
        key: pem_file(&key_pair.serialize_pem()),
        cert_pem,
    }
}

fn pem_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}
