//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Create instance → Resolve config → Security → Validation → Docs
//!         → Shutdown hooks → [dispose previous] → Listen → [accept/dispose]
//!
//! Generation phases (state.rs):
//!     Created → Configuring → Listening → Disposing → Closed
//!
//! Dispose (manager.rs):
//!     Stop accepting → Drain (bounded) → Release socket → Cleanup hooks
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Latch process termination
//!     SIGHUP → Trigger reload
//! ```
//!
//! # Design Decisions
//! - Process-level state is injected (`LifecycleState`), never global
//! - At most one generation holds the listen socket
//! - The previous generation is closed before the next one binds

pub mod manager;
pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use manager::{DisposeError, LifecycleManager};
pub use reload::{ReloadError, ReloadSupervisor};
pub use shutdown::{Shutdown, ShutdownHooks};
pub use startup::BootstrapOrchestrator;
pub use state::{GenerationId, LifecycleError, LifecycleState, Phase};
