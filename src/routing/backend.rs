//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent an upstream base address (scheme + authority)
//! - Look up the backend for a virtual host
//! - Allow the map to be swapped atomically on reload

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::uri::{Authority, Scheme};
use url::Url;

use crate::config::VirtualHostConfig;
use crate::error::StartupError;

/// Resolves a virtual host (port already stripped) to a backend.
pub trait Backend: Send + Sync + fmt::Debug {
    fn lookup(&self, host: &str) -> Option<BackendAddress>;
}

/// Scheme and authority of an upstream API endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddress {
    scheme: Scheme,
    authority: Authority,
}

impl BackendAddress {
    /// Parse a backend URL such as `https://10.0.0.1:6443`.
    ///
    /// Only `http` and `https` are accepted. A path other than `/` or any
    /// query string is refused since it would be silently dropped.
    pub fn parse(raw: &str) -> Result<Self, StartupError> {
        let url = Url::parse(raw).map_err(|e| StartupError::backend(raw, e.to_string()))?;

        let scheme = match url.scheme() {
            "https" => Scheme::HTTPS,
            "http" => Scheme::HTTP,
            other => {
                return Err(StartupError::backend(
                    raw,
                    format!("unsupported scheme {other:?}"),
                ))
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| StartupError::backend(raw, "missing host"))?;

        if !matches!(url.path(), "" | "/") || url.query().is_some() {
            return Err(StartupError::backend(raw, "path and query are not supported"));
        }

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = authority
            .parse::<Authority>()
            .map_err(|e| StartupError::backend(raw, e.to_string()))?;

        Ok(Self { scheme, authority })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Static virtual host map, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct VirtualHosts {
    hosts: HashMap<String, BackendAddress>,
}

impl VirtualHosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from configuration entries.
    pub fn from_config(entries: &[VirtualHostConfig]) -> Result<Self, StartupError> {
        let mut hosts = Self::new();
        for entry in entries {
            hosts.insert(&entry.host, BackendAddress::parse(&entry.backend)?);
        }
        Ok(hosts)
    }

    /// Register `host`; a later entry for the same host replaces the earlier one.
    pub fn insert(&mut self, host: &str, backend: BackendAddress) {
        self.hosts.insert(host.to_ascii_lowercase(), backend);
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl Backend for VirtualHosts {
    fn lookup(&self, host: &str) -> Option<BackendAddress> {
        self.hosts.get(&host.to_ascii_lowercase()).cloned()
    }
}

/// Virtual host map that can be replaced while requests are in flight.
///
/// Each lookup reads one consistent snapshot.
#[derive(Debug)]
pub struct DynamicVirtualHosts {
    current: ArcSwap<VirtualHosts>,
}

impl DynamicVirtualHosts {
    pub fn new(initial: VirtualHosts) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Publish a new map. Lookups already running keep the old one.
    pub fn replace(&self, hosts: VirtualHosts) {
        tracing::info!(virtual_hosts = hosts.len(), "Virtual host map replaced");
        self.current.store(Arc::new(hosts));
    }

    pub fn snapshot(&self) -> Arc<VirtualHosts> {
        self.current.load_full()
    }
}

impl Backend for DynamicVirtualHosts {
    fn lookup(&self, host: &str) -> Option<BackendAddress> {
        self.current.load().lookup(host)
    }
}
