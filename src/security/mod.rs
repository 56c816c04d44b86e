//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     ← headers.rs (fixed security header set, outermost)
//!     ← cors.rs (permissive cross-origin headers)
//!     ← limits.rs (body size, request timeout)
//!     ← handler
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod cors;
pub mod headers;
pub mod limits;

pub use headers::SecurityHeaders;
