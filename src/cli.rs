//! Command-line interface.
//!
//! Flags override the matching config file fields. Without `--config` the
//! proxy runs from defaults plus flags alone.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ProxyConfig, TlsConfig, VirtualHostConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "kube-secure-proxy")]
#[command(about = "TLS-terminating reverse proxy for the Kubernetes API with path filtering", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Proxy listen address [default: 127.0.0.1:8443]
    #[arg(long)]
    pub listen: Option<String>,

    /// Virtual host served by --api-endpoint
    #[arg(long, default_value = "127.0.0.1", requires = "api_endpoint")]
    pub virtual_host: String,

    /// Endpoint of the Kubernetes API node (e.g. https://10.0.0.1:6443)
    #[arg(long)]
    pub api_endpoint: Option<String>,

    /// CA certificate used to verify the API node, in addition to system roots
    #[arg(long)]
    pub ca: Option<PathBuf>,

    /// Certificate for the proxy listener
    #[arg(long, requires = "key")]
    pub cert: Option<PathBuf>,

    /// Private key for the proxy listener
    #[arg(long, requires = "cert")]
    pub key: Option<PathBuf>,

    /// Comma-separated regexes; matching paths are always denied
    #[arg(long)]
    pub reject_paths: Option<String>,

    /// Comma-separated regexes; paths must match one to be allowed
    #[arg(long)]
    pub accept_paths: Option<String>,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Write every given flag into `config`.
    ///
    /// `--api-endpoint` replaces the configured virtual hosts with the single
    /// `--virtual-host` entry.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(listen) = &self.listen {
            config.listener.bind_address = listen.clone();
        }
        if let (Some(cert), Some(key)) = (&self.cert, &self.key) {
            config.listener.tls = Some(TlsConfig {
                cert_path: cert.display().to_string(),
                key_path: key.display().to_string(),
            });
        }
        if let Some(endpoint) = &self.api_endpoint {
            config.virtual_hosts = vec![VirtualHostConfig {
                host: self.virtual_host.clone(),
                backend: endpoint.clone(),
            }];
        }
        if let Some(ca) = &self.ca {
            config.upstream.ca_path = Some(ca.display().to_string());
        }
        if let Some(reject) = &self.reject_paths {
            config.policy.reject_paths = reject.clone();
        }
        if let Some(accept) = &self.accept_paths {
            config.policy.accept_paths = accept.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}
