//! Fan-out/fan-in counter.
//!
//! A [`Counter`] tracks how many operations of a batch are still in flight
//! and runs its `on_zero` callback every time the count drops from one to
//! zero. Incrementing after a drain re-arms it for another cycle.
//!
//! When the decrements can come from parallel tasks, the whole sibling
//! batch must be armed (see [`Counter::increment_by`]) before any of those
//! tasks is spawned. Otherwise an early child can take the count back to
//! zero while its siblings are still being dispatched.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type Callback = Box<dyn Fn() + Send + Sync>;

struct Inner {
    name: String,
    remaining: AtomicUsize,
    on_zero: Callback,
}

/// Shared in-flight counter with a drain callback.
///
/// Cloning is cheap; all clones observe the same count.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<Inner>,
}

impl Counter {
    /// Create an idle counter that calls `on_zero` on every drain.
    pub fn new(name: impl Into<String>, on_zero: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                remaining: AtomicUsize::new(0),
                on_zero: Box::new(on_zero),
            }),
        }
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of registered operations that have not finished.
    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    /// Register one more in-flight operation.
    pub fn increment(&self) {
        self.increment_by(1);
    }

    /// Register a whole batch in one step.
    pub fn increment_by(&self, n: usize) {
        if n == 0 {
            return;
        }
        self.inner.remaining.fetch_add(n, Ordering::AcqRel);
    }

    /// Mark one operation finished, firing `on_zero` on the 1 -> 0 transition.
    ///
    /// Returns `true` if this call fired the callback.
    pub fn decrement(&self) -> bool {
        let previous = self
            .inner
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => {
                tracing::trace!(counter = %self.inner.name, "drained");
                (self.inner.on_zero)();
                true
            }
            Ok(_) => false,
            Err(_) => {
                tracing::warn!(counter = %self.inner.name, "decrement on idle counter ignored");
                false
            }
        }
    }

    /// Increment now and decrement when the returned guard is dropped.
    pub fn guard(&self) -> CounterGuard {
        self.increment();
        CounterGuard {
            counter: self.clone(),
        }
    }

    /// Take over one already-registered slot.
    ///
    /// Used after [`Counter::increment_by`] so each child of a pre-armed
    /// batch releases exactly one slot, even if it panics.
    pub fn adopt(&self) -> CounterGuard {
        CounterGuard {
            counter: self.clone(),
        }
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("name", &self.inner.name)
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Decrements its counter on drop.
#[must_use = "dropping the guard immediately finishes the operation"]
#[derive(Debug)]
pub struct CounterGuard {
    counter: Counter,
}

impl Drop for CounterGuard {
    fn drop(&mut self) {
        self.counter.decrement();
    }
}
