//! Dispatch queue handle, configuration and status

use serde::Serialize;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info};

use super::pending::{Enqueued, PendingWork};
use super::processor;
use super::rate_window::RateWindow;
use super::retry::RetryPolicy;
use super::work_item::{Operation, OperationFuture};
use crate::constants::{dispatch, retry};
use crate::error::AppError;

/// Tuning for one dispatch queue instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Admissions allowed within any trailing `window`
    pub max_per_window: NonZeroUsize,
    pub window: Duration,
    /// Fixed pause after every dispatch, whatever the outcome
    pub inter_dispatch_delay: Duration,
    /// Pause of the whole queue after a rate-limit rejection
    pub cooldown: Duration,
    /// Dispatch attempts per work item
    pub max_attempts: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_per_window: NonZeroUsize::new(dispatch::MAX_REQUESTS_PER_WINDOW)
                .unwrap_or(NonZeroUsize::MIN),
            window: Duration::from_secs(dispatch::WINDOW_SECONDS),
            inter_dispatch_delay: Duration::from_millis(dispatch::INTER_DISPATCH_DELAY_MS),
            cooldown: Duration::from_secs(retry::RATE_LIMIT_COOLDOWN_SECONDS),
            max_attempts: retry::MAX_ATTEMPTS,
        }
    }
}

impl DispatchConfig {
    /// Default configuration with a different per-window budget.
    ///
    /// A budget of zero could never admit anything and is rejected.
    pub fn with_max_per_window(max_per_window: usize) -> Result<Self, AppError> {
        let max_per_window = NonZeroUsize::new(max_per_window).ok_or_else(|| {
            AppError::config_error("Dispatch budget must allow at least one request per window")
        })?;
        Ok(Self {
            max_per_window,
            ..Self::default()
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            cooldown: self.cooldown,
        }
    }
}

/// Read-only snapshot for dashboards. Taking it never affects scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queue_size: usize,
    pub is_draining: bool,
    pub admitted_in_last_window: usize,
    pub max_per_window: usize,
}

/// State owned by the processor loop; mutated only under `Shared::state`.
pub(super) struct QueueState<T> {
    pub pending: PendingWork<T>,
    pub window: RateWindow,
    pub draining: bool,
}

pub(super) struct Shared<T> {
    pub config: DispatchConfig,
    state: Mutex<QueueState<T>>,
}

impl<T> Shared<T> {
    /// Locks the queue state. A poisoned lock is recovered: every mutation
    /// leaves the state consistent before anything that could panic runs.
    pub fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rate-limited, deduplicating dispatch queue.
///
/// Cloning yields another handle to the same queue. Construct one per process
/// and pass it to every API client that shares the provider quota.
///
/// # Example
/// ```no_run
/// use fixture_dispatch::dispatch::{DispatchConfig, DispatchQueue};
/// use fixture_dispatch::AppError;
///
/// # async fn example() -> Result<(), AppError> {
/// let queue: DispatchQueue<String> = DispatchQueue::new(DispatchConfig::with_max_per_window(10)?);
/// let standings = queue
///     .submit("standings-league-39-2024", || async { Ok("table".to_string()) })
///     .await?;
/// assert_eq!(standings, "table");
/// # Ok(())
/// # }
/// ```
pub struct DispatchQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for DispatchQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> DispatchQueue<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(config: DispatchConfig) -> Self {
        info!(
            "Creating dispatch queue: max_per_window={}, window={:?}, cooldown={:?}, max_attempts={}",
            config.max_per_window, config.window, config.cooldown, config.max_attempts
        );
        let state = QueueState {
            pending: PendingWork::new(),
            window: RateWindow::new(config.max_per_window, config.window),
            draining: false,
        };
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn config(&self) -> DispatchConfig {
        self.shared.config
    }

    /// Queues `operation` under `key` and returns a future for its outcome.
    ///
    /// The caller's place in line is fixed when this is called, not when the
    /// returned future is first polled. If `key` is already pending or
    /// retrying, the caller joins that item and `operation` is never invoked.
    /// Must be called from within a Tokio runtime.
    pub fn submit<F, Fut>(
        &self,
        key: impl Into<String>,
        operation: F,
    ) -> impl Future<Output = Result<T, AppError>> + Send + 'static
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let key = key.into();
        let operation: Operation<T> =
            Arc::new(move || Box::pin(operation()) as OperationFuture<T>);
        let (tx, rx) = oneshot::channel();

        let start_loop = {
            let mut state = self.shared.lock();
            let enqueued = state.pending.submit(key.clone(), operation, tx);
            if enqueued == Enqueued::New {
                debug!(
                    "Queued new work item: key={}, queue_size={}",
                    key,
                    state.pending.len()
                );
            }
            if state.draining {
                false
            } else {
                state.draining = true;
                true
            }
        };

        if start_loop {
            debug!("Starting dispatch processor");
            tokio::spawn(processor::run(Arc::clone(&self.shared)));
        }

        async move {
            rx.await
                .unwrap_or_else(|_| Err(AppError::dispatch_aborted(key)))
        }
    }

    /// Current queue size, loop state and window usage.
    pub fn status(&self) -> QueueStatus {
        let state = self.shared.lock();
        QueueStatus {
            queue_size: state.pending.len(),
            is_draining: state.draining,
            admitted_in_last_window: state.window.admitted_in_window(Instant::now()),
            max_per_window: state.window.max_per_window(),
        }
    }
}
