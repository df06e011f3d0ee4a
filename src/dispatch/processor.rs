//! Processor loop draining the pending work list.
//!
//! One loop runs per queue while there is work (Draining) and exits once the
//! list is empty (Idle). Each step:
//! 1. prune admission records older than the window
//! 2. wait for window capacity if the budget is spent
//! 3. admit the head item: record the admission and invoke its operation
//! 4. settle every waiter, or move a throttled item to the tail and pause
//!    the whole queue for the cooldown
//! 5. sleep the fixed inter-dispatch delay

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use super::queue::Shared;
use super::retry::RetryDecision;
use super::work_item::Operation;
use crate::error::AppError;

/// Result of looking at the head of the list under the lock
enum Step<T> {
    /// List is empty; the loop has already switched to Idle
    Idle,
    /// Budget spent; re-evaluate after this long
    WaitForCapacity(Duration),
    /// Head item admitted; run its operation outside the lock
    Dispatch {
        key: String,
        attempt: u32,
        operation: Operation<T>,
    },
}

/// Resets the draining flag if the loop unwinds, so the next submit can
/// start a fresh loop instead of queueing behind a dead one.
struct DrainGuard<'a, T> {
    shared: &'a Shared<T>,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared.lock().draining = false;
        }
    }
}

pub(super) async fn run<T>(shared: Arc<Shared<T>>)
where
    T: Clone + Send + 'static,
{
    let _guard = DrainGuard { shared: &shared };
    let config = shared.config;
    let policy = config.retry_policy();

    loop {
        let (key, attempt, operation) = match next_step(&shared) {
            Step::Idle => {
                debug!("Dispatch queue drained, processor going idle");
                return;
            }
            Step::WaitForCapacity(wait) => {
                info!(
                    "Rate window full ({} per {:?}). Waiting {:?}",
                    config.max_per_window, config.window, wait
                );
                sleep(wait).await;
                continue;
            }
            Step::Dispatch {
                key,
                attempt,
                operation,
            } => (key, attempt, operation),
        };

        debug!("Dispatching: key={}, attempt={}", key, attempt);
        // Calling the operation can panic too, not just polling its future
        let outcome = AssertUnwindSafe(async { operation().await })
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(AppError::operation(format!("operation for '{key}' panicked"))));

        let mut cooldown = false;
        let settled = match outcome {
            Ok(value) => shared.lock().pending.remove(&key).map(|item| (item, Ok(value))),
            Err(err) => match policy.decide(&err, attempt) {
                RetryDecision::Requeue => {
                    warn!(
                        "Rate limit error for {}. Retrying after {:?} (attempt {}/{}): {}",
                        key, policy.cooldown, attempt, policy.max_attempts, err
                    );
                    shared.lock().pending.requeue(&key);
                    cooldown = true;
                    None
                }
                RetryDecision::Fail => {
                    error!("Failed: {} after {} attempt(s): {}", key, attempt, err);
                    shared.lock().pending.remove(&key).map(|item| (item, Err(err)))
                }
            },
        };

        if let Some((item, outcome)) = settled {
            item.settle(outcome);
        }

        if cooldown {
            sleep(policy.cooldown).await;
        }
        sleep(config.inter_dispatch_delay).await;
    }
}

fn next_step<T>(shared: &Shared<T>) -> Step<T>
where
    T: Clone,
{
    let mut guard = shared.lock();
    let state = &mut *guard;
    let now = Instant::now();
    state.window.prune(now);

    // Going idle under the same lock as submit, so no submission is stranded
    let Some(item) = state.pending.head_mut() else {
        state.draining = false;
        return Step::Idle;
    };

    if !state.window.has_capacity() {
        return Step::WaitForCapacity(state.window.wait_time(now));
    }

    state.window.record(now);
    item.attempt += 1;
    Step::Dispatch {
        key: item.key.clone(),
        attempt: item.attempt,
        operation: Arc::clone(&item.operation),
    }
}
