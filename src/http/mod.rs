//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection (axum-server, rustls)
//!     → server.rs (HTTP/1.1 or HTTP/2 inbound, every path to the fallback)
//!     → pipeline (tagger → logging → resolver → filter → executor)
//!     → server.rs (request errors rendered as plain-text responses)
//!     → Send to client
//! ```

pub mod server;

pub use server::{render, router, ProxyServer};
