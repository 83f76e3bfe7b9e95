//! Fan-out of sibling tasks joined through a [`Counter`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;
use tracing::Instrument;

use fantree_core::{Counter, FsError, Result};

/// Boxed future used at the recursion points of the tree algorithms.
pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// Run `task` for every item concurrently and wait for all of them.
///
/// The counter is armed with the full batch size before the first child is
/// spawned, so no child can drain it while siblings are still pending. Each
/// child owns one counter slot and releases it when it ends, including by
/// panic. Siblings of a failed child still run to completion; the first
/// error in completion order is returned.
pub(crate) async fn fan_out<I, T, F, Fut>(label: String, items: Vec<I>, task: F) -> Result<Vec<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let expected = items.len();
    if expected == 0 {
        return Ok(Vec::new());
    }

    let done = Arc::new(Notify::new());
    let signal = Arc::clone(&done);
    let counter = Counter::new(label, move || signal.notify_one());
    let results: Arc<Mutex<Vec<Result<T>>>> = Arc::new(Mutex::new(Vec::with_capacity(expected)));

    counter.increment_by(expected);
    for item in items {
        let slot = counter.adopt();
        let results = Arc::clone(&results);
        let child = task(item);
        tokio::spawn(
            async move {
                let result = child.await;
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(result);
                drop(slot);
            }
            .in_current_span(),
        );
    }

    done.notified().await;
    tracing::trace!(counter = counter.name(), children = expected, "fan-in complete");

    let results = std::mem::take(&mut *results.lock().unwrap_or_else(PoisonError::into_inner));
    if results.len() != expected {
        return Err(FsError::TaskFailed {
            message: format!(
                "{}: {} of {expected} children ended without a result",
                counter.name(),
                expected - results.len()
            ),
        });
    }
    results.into_iter().collect()
}
