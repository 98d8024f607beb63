//! Reference-counted "request in flight" indicator.
//!
//! Each request that participates takes a [`LoadingGuard`]; the indicator is
//! active while at least one guard is alive. Dropping the guard is the only way
//! to release it, so every completion path (success, failure, cancellation)
//! decrements exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

#[derive(Debug)]
struct Inner {
    in_flight: AtomicUsize,
    active: watch::Sender<bool>,
}

/// Shared loading indicator, cheap to clone.
#[derive(Debug, Clone)]
pub struct LoadingSignal {
    inner: Arc<Inner>,
}

impl Default for LoadingSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingSignal {
    /// Idle indicator.
    #[must_use]
    pub fn new() -> Self {
        let (active, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                in_flight: AtomicUsize::new(0),
                active,
            }),
        }
    }

    /// Register one in-flight request.
    #[must_use = "the request is counted only while the guard is alive"]
    pub fn begin(&self) -> LoadingGuard {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        self.publish();
        LoadingGuard {
            signal: self.clone(),
        }
    }

    /// Number of requests currently holding a guard.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Whether any request is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.in_flight() > 0
    }

    /// Receiver that observes every active/idle transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.active.subscribe()
    }

    fn finish(&self) {
        // Saturate at zero; a stray release must never wrap the counter.
        let _ = self
            .inner
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            });
        self.publish();
    }

    fn publish(&self) {
        let counter = &self.inner.in_flight;
        self.inner.active.send_if_modified(|active| {
            let next = counter.load(Ordering::SeqCst) > 0;
            let changed = *active != next;
            *active = next;
            changed
        });
    }
}

/// Holds one slot of the loading count until dropped.
#[derive(Debug)]
pub struct LoadingGuard {
    signal: LoadingSignal,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.signal.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_guards_keep_indicator_active() {
        let signal = LoadingSignal::new();
        let rx = signal.subscribe();
        assert!(!*rx.borrow());

        let first = signal.begin();
        let second = signal.begin();
        assert_eq!(signal.in_flight(), 2);
        assert!(*rx.borrow());

        drop(first);
        assert!(signal.is_active());
        assert!(*rx.borrow());

        drop(second);
        assert_eq!(signal.in_flight(), 0);
        assert!(!*rx.borrow());
    }

    #[tokio::test]
    async fn subscribers_see_idle_after_last_release() {
        let signal = LoadingSignal::new();
        let mut rx = signal.subscribe();
        let guard = signal.begin();
        rx.changed().await.expect("active transition");
        assert!(*rx.borrow_and_update());

        let worker = signal.clone();
        let handle = tokio::spawn(async move {
            drop(guard);
            worker.in_flight()
        });
        assert_eq!(handle.await.expect("join"), 0);
        rx.changed().await.expect("idle transition");
        assert!(!*rx.borrow());
    }

    #[tokio::test]
    async fn cancelled_future_releases_its_guard() {
        let signal = LoadingSignal::new();
        let held = signal.clone();
        let task = tokio::spawn(async move {
            let _guard = held.begin();
            std::future::pending::<()>().await;
        });
        tokio::task::yield_now().await;
        while signal.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;
        assert_eq!(signal.in_flight(), 0);
        assert!(!signal.is_active());
    }
}
