//! Rate-limited dispatch queue shared by every caller of the provider API.
//!
//! Callers submit a stable key plus an async operation. Identical keys that
//! are pending at the same time coalesce into a single execution, admissions
//! are capped per rolling window, and provider throttling is retried after a
//! queue-wide cooldown. Every caller receives exactly one settled outcome.

mod pending;
mod processor;
mod queue;
mod rate_window;
mod retry;
mod work_item;

pub use queue::{DispatchConfig, DispatchQueue, QueueStatus};
pub use rate_window::RateWindow;
pub use retry::{RetryDecision, RetryPolicy};
