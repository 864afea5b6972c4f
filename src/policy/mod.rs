//! Path policy subsystem.
//!
//! # Data Flow
//! ```text
//! Policy strings (reject, accept)
//!     → patterns.rs (split on ',', compile each regex)
//!     → path.rs (PathPolicy, frozen at startup)
//!
//! Request path
//!     → PathPolicy::evaluate
//!     → Allow | RejectedByDenyList | RejectedByAllowList
//! ```
//!
//! # Design Decisions
//! - Reject list always wins over the accept list
//! - Empty accept list denies everything (default-deny)
//! - Patterns match exactly as authored: no implicit anchoring
//! - Compiled once, shared via Arc, evaluated without locks

pub mod path;
pub mod patterns;

pub use path::{PathPolicy, Verdict};
pub use patterns::PatternList;

/// Default reject policy: pod subresources that open interactive streams.
pub const DEFAULT_PATH_REJECT_RE: &str =
    "^/api/.*/pods/.*/exec,^/api/.*/pods/.*/attach,^/api/.*/pods/.*/portforward";

/// Default accept policy: everything not rejected.
pub const DEFAULT_PATH_ACCEPT_RE: &str = "^.*";
