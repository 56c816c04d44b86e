//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedConfig.server (host, port)
//!     → listener.rs (bind, report local address)
//!     → axum::serve with graceful shutdown
//!     → connection.rs (in-flight request tracking for drains)
//! ```
//!
//! # Design Decisions
//! - One listen socket per process, owned by one generation at a time
//! - Each request tracked so disposal can observe the drain

pub mod connection;
pub mod listener;

pub use connection::ConnectionTracker;
