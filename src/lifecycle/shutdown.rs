//! Shutdown coordination.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::watch;

/// Coordinator for graceful shutdown of one generation.
///
/// The signal is latched: a trigger that happens before anyone waits is
/// still observed by later waiters.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Whether shutdown was already requested.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

type Hook = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Cleanup callbacks run when a generation is disposed.
///
/// Hooks run in reverse registration order. A hook that fails stays
/// registered so a second dispose attempt runs it again.
#[derive(Clone, Default)]
pub struct ShutdownHooks {
    hooks: Vec<(String, Hook)>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named cleanup hook.
    pub fn add<F, Fut>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks
            .push((name.into(), Arc::new(move || hook().boxed())));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook; failed hooks are kept and their errors returned.
    pub async fn run(&mut self) -> Vec<String> {
        let mut failed = Vec::new();
        let mut errors = Vec::new();

        while let Some((name, hook)) = self.hooks.pop() {
            match hook().await {
                Ok(()) => tracing::debug!(hook = %name, "Shutdown hook completed"),
                Err(e) => {
                    tracing::warn!(hook = %name, error = %e, "Shutdown hook failed");
                    errors.push(format!("{name}: {e}"));
                    failed.push((name, hook));
                }
            }
        }

        // Restore registration order for the retry.
        failed.reverse();
        self.hooks = failed;
        errors
    }
}

impl fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|(name, _)| name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[tokio::test]
    async fn trigger_before_wait_is_observed() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        tokio::time::timeout(std::time::Duration::from_millis(100), shutdown.wait())
            .await
            .expect("latched shutdown should resolve immediately");
    }

    #[tokio::test]
    async fn clones_share_the_signal() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();
        let waiter = tokio::spawn(async move { observer.wait().await });
        shutdown.trigger();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn hooks_run_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = ShutdownHooks::new();
        for name in ["first", "second", "third"] {
            let order = order.clone();
            hooks.add(name, move || {
                let order = order.clone();
                async move {
                    order.lock().unwrap().push(name);
                    Ok(())
                }
            });
        }

        assert!(hooks.run().await.is_empty());
        assert!(hooks.is_empty());
        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn failed_hooks_stay_for_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut hooks = ShutdownHooks::new();
        hooks.add("ok", || async { Ok(()) });
        {
            let attempts = attempts.clone();
            hooks.add("flaky", move || {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("pool still busy");
                    }
                    Ok(())
                }
            });
        }

        let errors = hooks.run().await;
        assert_eq!(errors, vec!["flaky: pool still busy"]);
        assert_eq!(hooks.len(), 1);

        assert!(hooks.run().await.is_empty());
        assert!(hooks.is_empty());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
