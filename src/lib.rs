//! Kubernetes API Secure Proxy Library

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pipeline;
pub mod policy;
pub mod routing;
pub mod status;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, StartupError};
pub use http::ProxyServer;
pub use lifecycle::{Shutdown, ShutdownSignal};
pub use pipeline::{compose, Stages};
