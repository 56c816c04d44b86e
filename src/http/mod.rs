//! HTTP service process.
//!
//! # Data Flow
//! ```text
//! ServiceConfig
//!     → server.rs (bootstrap first generation)
//!     → wait for termination or reload
//!         reload: watcher.rs / SIGHUP → new ServiceConfig → bootstrap next generation
//!         termination: close current generation → exit
//! ```

pub mod server;

pub use server::HttpServer;
