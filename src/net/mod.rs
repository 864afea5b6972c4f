//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound:  TCP accept (axum-server) → tls.rs server config (TLS 1.3) → HTTP layer
//! Outbound: pipeline executor → tls.rs client config (TLS 1.3, system roots + CA) → backend
//! ```
//!
//! # Design Decisions
//! - Both directions pin TLS 1.3; older protocol versions are never negotiated
//! - The outbound config carries no ALPN, so backends are always spoken to
//!   over HTTP/1.1; the executor bridges `Upgrade` requests the backend
//!   accepts with 101, and watches stream as ordinary chunked bodies
//! - All PEM material is read once at startup; a missing or empty file is fatal

pub mod tls;

pub use tls::{client_config, client_config_with_roots, server_config};
