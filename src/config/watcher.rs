//! Configuration file watcher for hot reload.
//!
//! Only the virtual host map is live-reloadable. Listener, TLS, upstream
//! client and path policy are built once at startup; changes to them are
//! logged and ignored until the next restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::ProxyConfig;
use crate::config::validation::validate_config;
use crate::lifecycle::ShutdownSignal;
use crate::routing::{DynamicVirtualHosts, VirtualHosts};

/// Adjustment re-applied to every reloaded file (command-line overrides).
pub type Overrides = Arc<dyn Fn(&mut ProxyConfig) + Send + Sync>;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    overrides: Option<Overrides>,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                overrides: None,
                update_tx,
            },
            update_rx,
        )
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let overrides = self.overrides.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading");
                        match reload(&path, overrides.as_ref()) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    "Failed to reload config, keeping current configuration"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn reload(path: &Path, overrides: Option<&Overrides>) -> Result<ProxyConfig, ConfigError> {
    let mut config = read_config(path)?;
    if let Some(apply) = overrides {
        apply(&mut config);
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply configuration updates until shutdown or until the watcher goes away.
pub async fn apply_updates(
    mut updates: mpsc::UnboundedReceiver<ProxyConfig>,
    hosts: Arc<DynamicVirtualHosts>,
    mut current: ProxyConfig,
    mut shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(new_config) => {
                    apply_update(&mut current, new_config, &hosts);
                }
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("Config update loop stopped");
}

/// Apply one validated configuration. Returns true if the host map changed.
pub fn apply_update(
    current: &mut ProxyConfig,
    new_config: ProxyConfig,
    hosts: &DynamicVirtualHosts,
) -> bool {
    let restart_only = [
        ("listener", current.listener != new_config.listener),
        ("upstream", current.upstream != new_config.upstream),
        ("policy", current.policy != new_config.policy),
        ("observability", current.observability != new_config.observability),
        ("shutdown", current.shutdown != new_config.shutdown),
    ];
    for (section, changed) in restart_only {
        if changed {
            tracing::warn!(section, "Config section changed; takes effect after restart");
        }
    }

    if current.virtual_hosts == new_config.virtual_hosts {
        tracing::debug!("Virtual hosts unchanged");
        return false;
    }

    match VirtualHosts::from_config(&new_config.virtual_hosts) {
        Ok(map) => {
            hosts.replace(map);
            current.virtual_hosts = new_config.virtual_hosts;
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected virtual host update");
            false
        }
    }
}
