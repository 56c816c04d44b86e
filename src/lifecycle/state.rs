//! Generation phases and the injected process-level lifecycle state.
//!
//! # Responsibilities
//! - Define the phase state machine of a generation
//! - Hand out generation ids
//! - Arbitrate the single listen socket between generations
//! - Hold the shutdown hooks of generations that enabled them
//! - Latch process termination requests
//! - Journal recent phase transitions (bounded)
//!
//! # Design Decisions
//! - One `LifecycleState` per process, passed explicitly (tests create their own)
//! - Transitions never skip a phase; `Listening` is only reached by a fresh generation

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::lifecycle::shutdown::{Shutdown, ShutdownHooks};

/// Identifies one bootstrap cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationId(u64);

impl GenerationId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Phase of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Created,
    Configuring,
    Listening,
    Disposing,
    Closed,
}

impl Phase {
    /// The only phase `self` may move to.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Created => Some(Phase::Configuring),
            Phase::Configuring => Some(Phase::Listening),
            Phase::Listening => Some(Phase::Disposing),
            Phase::Disposing => Some(Phase::Closed),
            Phase::Closed => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Created => "created",
            Phase::Configuring => "configuring",
            Phase::Listening => "listening",
            Phase::Disposing => "disposing",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("{generation}: invalid transition {from} -> {to}")]
    InvalidTransition {
        generation: GenerationId,
        from: Phase,
        to: Phase,
    },

    #[error("{generation}: listen socket is held by {holder}")]
    ListenerHeld {
        generation: GenerationId,
        holder: GenerationId,
    },
}

/// One journaled transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub generation: GenerationId,
    pub phase: Phase,
}

/// Transitions kept in the journal; older ones are dropped first.
pub const JOURNAL_CAPACITY: usize = 512;

/// Process-level lifecycle state shared by all generations.
#[derive(Debug, Default)]
pub struct LifecycleState {
    next_generation: AtomicU64,
    listener: Mutex<Option<GenerationId>>,
    hooks: Mutex<BTreeMap<GenerationId, ShutdownHooks>>,
    journal: Mutex<VecDeque<Transition>>,
    termination: Shutdown,
    signals_enabled: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LifecycleState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Allocate the id of a new generation.
    pub fn next_generation(&self) -> GenerationId {
        GenerationId(self.next_generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Claim the listen socket for `generation`.
    pub fn claim_listener(&self, generation: GenerationId) -> Result<(), LifecycleError> {
        let mut listener = lock(&self.listener);
        match *listener {
            Some(holder) if holder != generation => {
                Err(LifecycleError::ListenerHeld { generation, holder })
            }
            _ => {
                *listener = Some(generation);
                Ok(())
            }
        }
    }

    /// Release the listen socket if `generation` holds it.
    pub fn release_listener(&self, generation: GenerationId) {
        let mut listener = lock(&self.listener);
        if *listener == Some(generation) {
            *listener = None;
        }
    }

    /// The generation holding the listen socket, if any.
    pub fn listener_holder(&self) -> Option<GenerationId> {
        *lock(&self.listener)
    }

    /// Register the shutdown hooks of `generation`.
    pub fn install_hooks(&self, generation: GenerationId, hooks: ShutdownHooks) {
        lock(&self.hooks).insert(generation, hooks);
    }

    /// Remove and return the shutdown hooks of `generation`.
    pub fn take_hooks(&self, generation: GenerationId) -> Option<ShutdownHooks> {
        lock(&self.hooks).remove(&generation)
    }

    /// Generations with shutdown hooks enabled.
    pub fn hooked_generations(&self) -> Vec<GenerationId> {
        lock(&self.hooks).keys().copied().collect()
    }

    /// Process-wide termination latch, set by SIGINT/SIGTERM.
    pub fn termination(&self) -> &Shutdown {
        &self.termination
    }

    /// Ask the whole process to shut down.
    pub fn request_termination(&self) {
        self.termination.trigger();
    }

    /// Mark OS signal handling as installed; true only for the first caller.
    pub(crate) fn enable_signals(&self) -> bool {
        !self.signals_enabled.swap(true, Ordering::SeqCst)
    }

    fn record(&self, generation: GenerationId, phase: Phase) {
        let mut journal = lock(&self.journal);
        if journal.len() == JOURNAL_CAPACITY {
            journal.pop_front();
        }
        journal.push_back(Transition { generation, phase });
    }

    /// The most recent transitions, oldest first.
    pub fn journal(&self) -> Vec<Transition> {
        lock(&self.journal).iter().copied().collect()
    }
}

/// Phase of a single generation, observable through a watch channel.
#[derive(Debug)]
pub struct PhaseTracker {
    generation: GenerationId,
    tx: watch::Sender<Phase>,
    state: Arc<LifecycleState>,
}

impl PhaseTracker {
    /// Start tracking a new generation in `Created`.
    pub fn new(generation: GenerationId, state: Arc<LifecycleState>) -> Self {
        let (tx, _) = watch::channel(Phase::Created);
        state.record(generation, Phase::Created);
        tracing::debug!(generation = %generation, phase = %Phase::Created, "Phase entered");
        Self {
            generation,
            tx,
            state,
        }
    }

    pub fn generation(&self) -> GenerationId {
        self.generation
    }

    pub fn current(&self) -> Phase {
        *self.tx.borrow()
    }

    /// Move to `to`, which must be the successor of the current phase.
    pub fn advance(&self, to: Phase) -> Result<(), LifecycleError> {
        let from = self.current();
        if from.next() != Some(to) {
            return Err(LifecycleError::InvalidTransition {
                generation: self.generation,
                from,
                to,
            });
        }

        self.tx.send_replace(to);
        self.state.record(self.generation, to);
        tracing::info!(generation = %self.generation, phase = %to, "Phase entered");
        Ok(())
    }
}
