//! Kubernetes API Secure Proxy
//!
//! Terminates TLS in front of a Kubernetes control-plane API, denies
//! dangerous paths (exec, attach, port-forward by default) with a
//! Kubernetes-style Status object, and forwards everything else to the
//! backend selected by the request's virtual host.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────────┐
//!                    │                    SECURE PROXY                          │
//!   Client (kubectl) │  ┌──────────┐   ┌────────┐   ┌─────────┐   ┌──────────┐  │
//!   ─────────────────┼─▶│  https   │──▶│ tagger │──▶│ logging │──▶│ resolver │  │
//!                    │  │ listener │   └────────┘   └─────────┘   └────┬─────┘  │
//!                    │  └──────────┘                                   │        │
//!                    │                                                 ▼        │
//!                    │                   403 Status ◀──deny──┌──────────────┐   │
//!                    │                                       │ path filter  │   │
//!                    │                                       └──────┬───────┘   │
//!                    │                                              ▼ allow     │
//!                    │                                       ┌──────────────┐   │  Kubernetes
//!                    │                                       │   executor   │───┼─▶ API server
//!                    │                                       │ (TLS 1.3)    │   │
//!                    │                                       └──────────────┘   │
//!                    └──────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use kube_secure_proxy::cli::Cli;
use kube_secure_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use kube_secure_proxy::lifecycle;
use kube_secure_proxy::observability::init_logging;
use kube_secure_proxy::StartupError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("kube-secure-proxy: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: Cli) -> Result<(), StartupError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kube-secure-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        virtual_hosts = config.virtual_hosts.len(),
        config_file = ?cli.config.as_deref().map(Path::display),
        "Configuration loaded"
    );

    let config_path = cli.config.clone();
    let overrides = Arc::new(move |config: &mut ProxyConfig| cli.apply(config));
    lifecycle::run(config, config_path, overrides).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
