//! HTTPS listener tests: TLS termination, graceful shutdown, and HTTPS backends.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::task::JoinHandle;

use kube_secure_proxy::config::UpstreamConfig;
use kube_secure_proxy::http::{router, ProxyServer};
use kube_secure_proxy::lifecycle::Shutdown;
use kube_secure_proxy::net::tls;
use kube_secure_proxy::pipeline::{compose, UpstreamClient};
use kube_secure_proxy::routing::{BackendAddress, VirtualHosts};

mod common;

async fn start_tls_server(
    app: Router,
    tls: RustlsConfig,
    shutdown: &Shutdown,
) -> (SocketAddr, JoinHandle<()>) {
    let server = ProxyServer::new(
        app,
        tls,
        "127.0.0.1:0".parse().unwrap(),
        Duration::from_secs(1),
    );
    let handle = server.handle();
    let rx = shutdown.subscribe();
    let task = tokio::spawn(async move {
        server.run(rx).await.unwrap();
    });
    let addr = handle.listening().await.unwrap();
    (addr, task)
}

fn client_trusting(pem: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .add_root_certificate(reqwest::Certificate::from_pem(pem.as_bytes()).unwrap())
        .build()
        .unwrap()
}

#[tokio::test]
async fn https_listener_proxies_and_denies() {
    let backend = common::start_mock_backend().await;
    let fixture = common::tls_fixture(&["localhost"]);
    let server_tls = tls::server_config(fixture.cert.path(), fixture.key.path()).unwrap();

    let pipeline = compose(
        common::stages(
            common::single_host("localhost", &backend),
            kube_secure_proxy::policy::DEFAULT_PATH_REJECT_RE,
            kube_secure_proxy::policy::DEFAULT_PATH_ACCEPT_RE,
        ),
        common::plain_upstream(),
    );
    let shutdown = Shutdown::new();
    let (addr, task) = start_tls_server(router(pipeline), server_tls, &shutdown).await;

    let client = client_trusting(&fixture.cert_pem);
    let base = format!("https://localhost:{}", addr.port());

    let resp = client.get(format!("{}/api/v1/pods", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client
        .post(format!("{}/api/v1/namespaces/foo/pods/bar/exec", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    assert_eq!(backend.calls(), 1);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn https_backend_verified_with_extra_ca() {
    // Backend terminates TLS with a certificate the system store does not know.
    let backend_fixture = common::tls_fixture(&["localhost"]);
    let backend_tls =
        tls::server_config(backend_fixture.cert.path(), backend_fixture.key.path()).unwrap();
    let upstream_app = Router::new().fallback(|| async { "tls:ok" });
    let shutdown = Shutdown::new();
    let (backend_addr, _backend_task) =
        start_tls_server(upstream_app, backend_tls, &shutdown).await;

    let client_tls = tls::client_config(Some(backend_fixture.cert.path())).unwrap();
    let mut hosts = VirtualHosts::new();
    hosts.insert(
        "localhost",
        BackendAddress::parse(&format!("https://localhost:{}", backend_addr.port())).unwrap(),
    );
    let pipeline = compose(
        common::stages(Arc::new(hosts), "", ".*"),
        UpstreamClient::new(client_tls, &UpstreamConfig::default()),
    );
    let fixture = common::tls_fixture(&["localhost"]);
    let server_tls = tls::server_config(fixture.cert.path(), fixture.key.path()).unwrap();
    let (addr, _task) = start_tls_server(router(pipeline), server_tls, &shutdown).await;

    let resp = client_trusting(&fixture.cert_pem)
        .get(format!("https://localhost:{}/version", addr.port()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "tls:ok");
    shutdown.trigger();
}

#[tokio::test]
async fn untrusted_backend_certificate_is_bad_gateway() {
    let backend_fixture = common::tls_fixture(&["localhost"]);
    let backend_tls =
        tls::server_config(backend_fixture.cert.path(), backend_fixture.key.path()).unwrap();
    let shutdown = Shutdown::new();
    let (backend_addr, _backend_task) =
        start_tls_server(Router::new().fallback(|| async { "secret" }), backend_tls, &shutdown).await;

    // Empty root store: nothing is trusted.
    let client_tls = tls::client_config_with_roots(rustls::RootCertStore::empty()).unwrap();
    let mut hosts = VirtualHosts::new();
    hosts.insert(
        "127.0.0.1",
        BackendAddress::parse(&format!("https://localhost:{}", backend_addr.port())).unwrap(),
    );
    let app = router(compose(
        common::stages(Arc::new(hosts), "", ".*"),
        UpstreamClient::new(client_tls, &UpstreamConfig::default()),
    ));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let resp = reqwest::get(format!("http://{}/version", addr)).await.unwrap();
    assert_eq!(resp.status(), 502);
    assert_eq!(resp.text().await.unwrap(), "upstream request failed\n");
    shutdown.trigger();
}
