//! Control-plane status responses.
//!
//! # Data Flow
//! ```text
//! Path filter rejection (DenialReason)
//!     → denial.rs (DenialResponder::respond)
//!     → envelope.rs (StatusEncoder builds + serializes StatusEnvelope)
//!     → 403 response, PolicyDenial extension attached
//! ```
//!
//! # Design Decisions
//! - The encoder is an explicit immutable value, not process-wide state
//! - Only policy denials use the envelope; proxy faults stay plain HTTP
//!   errors so clients never mistake them for API server rejections

pub mod denial;
pub mod envelope;

pub use denial::{DenialReason, DenialResponder, PolicyDenial};
pub use envelope::{ListMeta, StatusEncoder, StatusEnvelope, REASON_FORBIDDEN, STATUS_FAILURE};
