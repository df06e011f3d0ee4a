//! Retry and backoff policy for provider throttling

use std::time::Duration;

use crate::error::AppError;

/// Fixed-attempt, fixed-cooldown retry policy.
///
/// Only rate-limit failures are retried. A retry pauses the entire queue for
/// `cooldown`, since the provider quota is shared by every caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub cooldown: Duration,
}

/// What the processor does with a failed work item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Move the item to the tail and pause the queue
    Requeue,
    /// Settle every waiter with the error
    Fail,
}

impl RetryPolicy {
    /// `attempt` is the number of dispatches already made for the item,
    /// including the one that produced `error`.
    pub fn decide(&self, error: &AppError, attempt: u32) -> RetryDecision {
        if error.is_rate_limited() && attempt < self.max_attempts {
            RetryDecision::Requeue
        } else {
            RetryDecision::Fail
        }
    }
}
