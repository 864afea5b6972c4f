//! Routing subsystem: virtual host → backend resolution.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header or URI authority)
//!     → host.rs (extract host, strip port on first ':')
//!     → backend.rs (Backend::lookup)
//!     → Return: BackendAddress or None
//!
//! Map Compilation (at startup / reload):
//!     VirtualHostConfig[]
//!     → parse backend URLs (scheme + authority only)
//!     → Freeze as immutable VirtualHosts
//!     → optionally published through DynamicVirtualHosts
//! ```
//!
//! # Design Decisions
//! - Lookup is a trait so static and reloadable maps share one seam
//! - Host matching is case-insensitive (per HTTP spec)
//! - A miss is explicit (None), never a silent default backend
//! - Only scheme and authority are taken from the backend URL

pub mod backend;
pub mod host;

pub use backend::{Backend, BackendAddress, DynamicVirtualHosts, VirtualHosts};
pub use host::{request_host, strip_port};
