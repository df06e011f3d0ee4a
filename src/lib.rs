//! Dispatch layer for a quota-limited football statistics API.
//!
//! Import workflows submit work through one shared [`DispatchQueue`]: a stable
//! key plus an async operation. The queue keeps calls under a per-minute
//! budget, coalesces identical in-flight requests and retries provider
//! throttling after a queue-wide cooldown.
//!
//! # Examples
//!
//! ```rust,no_run
//! use fixture_dispatch::api_client::FootballApi;
//! use fixture_dispatch::config::Config;
//! use fixture_dispatch::error::AppError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let config = Config::load().await?;
//!     let api = FootballApi::from_config(&config)?;
//!
//!     // Both calls share one admission: same endpoint and parameters
//!     let (lineups, again) = tokio::join!(
//!         api.get("/fixtures/lineups", &[("fixture", "215662")]),
//!         api.get("/fixtures/lineups", &[("fixture", "215662")]),
//!     );
//!     assert_eq!(lineups?, again?);
//!
//!     println!("{:?}", api.queue_status());
//!     Ok(())
//! }
//! ```

pub mod api_client;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;

// Re-export commonly used types for convenience
pub use api_client::FootballApi;
pub use config::Config;
pub use dispatch::{DispatchConfig, DispatchQueue, QueueStatus};
pub use error::AppError;

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
