//! Work item record coupling a key, its operation and everyone waiting on it

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use crate::error::AppError;

/// Future returned by one invocation of an operation
pub type OperationFuture<T> = BoxFuture<'static, Result<T, AppError>>;

/// Zero-argument async callable performing one remote call.
/// Re-invoked once per admitted attempt.
pub type Operation<T> = Arc<dyn Fn() -> OperationFuture<T> + Send + Sync>;

/// Continuation of a single caller awaiting the outcome of a key
pub type Waiter<T> = oneshot::Sender<Result<T, AppError>>;

/// Queue-internal record for one logical remote call.
pub struct WorkItem<T> {
    pub key: String,
    pub operation: Operation<T>,
    pub waiters: Vec<Waiter<T>>,
    /// Number of times the operation has been dispatched so far
    pub attempt: u32,
    pub enqueued_at: Instant,
}

impl<T: Clone> WorkItem<T> {
    pub fn new(key: String, operation: Operation<T>, waiter: Waiter<T>) -> Self {
        Self {
            key,
            operation,
            waiters: vec![waiter],
            attempt: 0,
            enqueued_at: Instant::now(),
        }
    }

    /// Adds another caller to this item; it will receive the same outcome.
    pub fn attach(&mut self, waiter: Waiter<T>) {
        self.waiters.push(waiter);
    }

    /// Delivers the terminal outcome to every waiter and consumes the item.
    ///
    /// Values are cloned for all but the last waiter. Errors are shared
    /// through one `Arc`; the last waiter gets the original error back when
    /// nobody else still holds it. Returns how many waiters were still
    /// listening.
    pub fn settle(self, outcome: Result<T, AppError>) -> usize {
        let mut waiters = self.waiters;
        let Some(last) = waiters.pop() else {
            return 0;
        };

        let mut delivered = 0;
        match outcome {
            Ok(value) => {
                for waiter in waiters {
                    delivered += usize::from(waiter.send(Ok(value.clone())).is_ok());
                }
                delivered += usize::from(last.send(Ok(value)).is_ok());
            }
            Err(error) => {
                let shared = Arc::new(error);
                for waiter in waiters {
                    let error = AppError::Shared(Arc::clone(&shared));
                    delivered += usize::from(waiter.send(Err(error)).is_ok());
                }
                let error = Arc::try_unwrap(shared).unwrap_or_else(AppError::Shared);
                delivered += usize::from(last.send(Err(error)).is_ok());
            }
        }

        debug!(
            "Settled work item: key={}, delivered={}, attempts={}, age={:?}",
            self.key,
            delivered,
            self.attempt,
            self.enqueued_at.elapsed()
        );
        delivered
    }
}

#[cfg(test)]
pub(crate) fn operation_from<T, F>(f: F) -> Operation<T>
where
    F: Fn() -> Result<T, AppError> + Send + Sync + 'static,
    T: Send + 'static,
{
    Arc::new(move || {
        let result = f();
        Box::pin(async move { result }) as OperationFuture<T>
    })
}
