//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count requests a generation is still serving
//! - Report what was still in flight when a drain timed out
//!
//! # Design Decisions
//! - Counting is a middleware, so every route of the generation is covered
//! - Guards decrement on drop, including when a handler panics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::Router;

/// Process-wide request sequence.
static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

/// Tracks in-flight requests of one generation.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
    served: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            served: Arc::clone(&self.served),
            seq: REQUEST_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Requests currently being served.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Requests completed so far.
    pub fn served_count(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }

    /// Count every request that passes through `router`.
    pub fn layer<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let tracker = self.clone();
        router.layer(middleware::from_fn(move |req: Request, next: Next| {
            let guard = tracker.track();
            async move {
                let response = next.run(req).await;
                drop(guard);
                response
            }
        }))
    }
}

/// Guard that tracks a request's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    served: Arc<AtomicU64>,
    seq: u64,
}

impl ConnectionGuard {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        self.served.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(request_seq = self.seq, "Request finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_seq_unique() {
        let tracker = ConnectionTracker::new();
        let a = tracker.track();
        let b = tracker.track();
        assert_ne!(a.seq(), b.seq());
    }

    #[test]
    fn tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.served_count(), 2);
    }
}
