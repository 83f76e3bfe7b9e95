//! Per-facade operation tracking.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::counter::{Counter, CounterGuard};

/// Counts every primitive operation dispatched through one facade.
///
/// Unlike a fan-in batch, a tracker is level-triggered: it reports a drain
/// each time the in-flight count returns to zero, for as long as it lives.
#[derive(Clone)]
pub struct OperationTracker {
    counter: Counter,
    drains: Arc<watch::Sender<u64>>,
}

impl OperationTracker {
    /// Create a tracker with no drain callback.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_callback(name, || {})
    }

    /// Create a tracker that runs `on_drain` every time it becomes idle.
    pub fn with_callback(
        name: impl Into<String>,
        on_drain: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        let (tx, _) = watch::channel(0u64);
        let drains = Arc::new(tx);
        let signal = Arc::clone(&drains);

        let counter = Counter::new(name, move || {
            signal.send_modify(|n| *n += 1);
            on_drain();
        });

        Self { counter, drains }
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        self.counter.name()
    }

    /// Record that an operation is about to be dispatched.
    pub fn started(&self) {
        self.counter.increment();
    }

    /// Record that a dispatched operation completed, successfully or not.
    pub fn finished(&self) {
        self.counter.decrement();
    }

    /// `started()` now, `finished()` when the guard drops.
    pub fn start(&self) -> OperationGuard {
        OperationGuard {
            _slot: self.counter.guard(),
        }
    }

    /// Operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.counter.remaining()
    }

    /// How many times the tracker has drained so far.
    pub fn drain_count(&self) -> u64 {
        *self.drains.borrow()
    }

    /// Wait until nothing is in flight.
    ///
    /// Returns immediately when already idle.
    pub async fn wait_idle(&self) {
        let mut rx = self.drains.subscribe();
        if self.in_flight() == 0 {
            return;
        }
        // The sender lives in `self`, so `changed` cannot report a closed channel here.
        let _ = rx.changed().await;
    }
}

impl fmt::Debug for OperationTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationTracker")
            .field("name", &self.name())
            .field("in_flight", &self.in_flight())
            .field("drains", &self.drain_count())
            .finish()
    }
}

/// RAII registration of one in-flight operation.
#[must_use = "dropping the guard immediately finishes the operation"]
#[derive(Debug)]
pub struct OperationGuard {
    _slot: CounterGuard,
}
