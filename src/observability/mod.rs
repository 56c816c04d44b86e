//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (generation, phase, step)
//!
//! HTTP layers produce:
//!     → tower-http TraceLayer spans per request
//!     → x-request-id set and propagated on every response
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Request ID flows through all layers

pub mod logging;

pub use logging::init_tracing;
