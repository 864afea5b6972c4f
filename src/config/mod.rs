//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs overrides (flags win over the file)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ProxyConfig (validated, immutable)
//!
//! On file change (reload.watch = true):
//!     watcher.rs detects change
//!     → loader.rs loads new config, overrides re-applied
//!     → validation.rs validates
//!     → virtual host map swapped atomically
//!     → everything else is kept until restart
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the virtual host map reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, PolicyConfig, ProxyConfig, ReloadConfig,
    ShutdownConfig, TlsConfig, UpstreamConfig, VirtualHostConfig,
};
pub use validation::{validate_config, ValidationError};
