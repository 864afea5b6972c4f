//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into policy, host map and TLS material
//! - Compose the pipeline around the upstream client
//! - Start background tasks (signals, config watcher, metrics)
//! - Bind the HTTPS listener last, so traffic arrives only when ready

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::watcher::{apply_updates, ConfigWatcher, Overrides};
use crate::config::ProxyConfig;
use crate::error::StartupError;
use crate::http::{router, ProxyServer};
use crate::lifecycle::{spawn_signal_handler, Shutdown};
use crate::net::tls;
use crate::observability::init_metrics;
use crate::pipeline::{compose, Pipeline, Stages, UpstreamClient};
use crate::policy::PathPolicy;
use crate::routing::{DynamicVirtualHosts, VirtualHosts};
use crate::status::DenialResponder;

/// Assembled request path plus the host map handle used for reloads.
pub struct Proxy {
    pub hosts: Arc<DynamicVirtualHosts>,
    pub pipeline: Pipeline<UpstreamClient>,
}

/// Build the pipeline from `config`. Fails on any bad pattern, backend or CA.
pub fn build_pipeline(config: &ProxyConfig) -> Result<Proxy, StartupError> {
    let policy = PathPolicy::new(&config.policy.reject_paths, &config.policy.accept_paths)?;
    tracing::info!(
        reject_patterns = policy.reject_patterns().len(),
        accept_patterns = policy.accept_patterns().len(),
        "Path policy compiled"
    );

    let hosts = Arc::new(DynamicVirtualHosts::new(VirtualHosts::from_config(
        &config.virtual_hosts,
    )?));
    for entry in &config.virtual_hosts {
        tracing::info!(host = %entry.host, backend = %entry.backend, "Virtual host registered");
    }

    let client_tls = tls::client_config(config.upstream.ca_path.as_deref().map(Path::new))?;
    let executor = UpstreamClient::new(client_tls, &config.upstream);

    let stages = Stages {
        backends: hosts.clone(),
        policy: Arc::new(policy),
        responder: Arc::new(DenialResponder::default()),
    };

    Ok(Proxy {
        hosts,
        pipeline: compose(stages, executor),
    })
}

/// Run the proxy until a shutdown signal. `config` must already be validated.
pub async fn run(
    config: ProxyConfig,
    config_path: Option<PathBuf>,
    overrides: Overrides,
) -> Result<(), StartupError> {
    let bind_address: SocketAddr = config.listener.bind_address.parse().map_err(|e| {
        StartupError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid bind address {:?}: {}", config.listener.bind_address, e),
        ))
    })?;

    let listener_tls = config
        .listener
        .tls
        .as_ref()
        .ok_or_else(|| StartupError::tls("listener certificate and key are required"))?;
    let server_tls = tls::server_config(
        Path::new(&listener_tls.cert_path),
        Path::new(&listener_tls.key_path),
    )?;

    let proxy = build_pipeline(&config)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse().map_err(|e| {
            StartupError::Metrics(format!(
                "invalid metrics address {:?}: {}",
                config.observability.metrics_address, e
            ))
        })?;
        init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();

    // Dropping the watcher stops notifications, so it lives until run returns.
    let _watcher = match (&config_path, config.reload.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let watcher = watcher.with_overrides(overrides).run()?;
            tokio::spawn(apply_updates(
                updates,
                proxy.hosts.clone(),
                config.clone(),
                shutdown.subscribe(),
            ));
            Some(watcher)
        }
        (None, true) => {
            tracing::warn!("Reload requested without a config file; watching disabled");
            None
        }
        _ => None,
    };

    let server = ProxyServer::new(
        router(proxy.pipeline),
        server_tls,
        bind_address,
        Duration::from_secs(config.shutdown.grace_period_secs),
    );
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown.clone());
    server.run(server_shutdown).await?;

    // Stop the update loop if the server exited on its own.
    shutdown.trigger();
    Ok(())
}
