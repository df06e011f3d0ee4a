//! Application-wide constants and configuration values
//!
//! This module centralizes the queue tuning numbers, HTTP defaults and
//! environment variable names so they are defined in exactly one place.

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Maximum number of connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Default base URL of the football statistics provider
pub const DEFAULT_API_BASE_URL: &str = "https://v3.football.api-sports.io";

/// Header carrying the provider API key
pub const API_KEY_HEADER: &str = "x-apisports-key";

/// Dispatch queue tuning
pub mod dispatch {
    /// Admissions allowed per rolling window. The provider's pro plan allows
    /// roughly 450 calls per minute; 440 leaves some headroom.
    pub const MAX_REQUESTS_PER_WINDOW: usize = 440;

    /// Length of the rolling admission window (seconds)
    pub const WINDOW_SECONDS: u64 = 60;

    /// Fixed pause between consecutive dispatches (milliseconds).
    /// 75ms caps bursts at roughly 13 requests per second.
    pub const INTER_DISPATCH_DELAY_MS: u64 = 75;

    /// Extra wait added when the window is full, so the oldest record has
    /// definitely aged out when the loop re-evaluates (milliseconds)
    pub const WINDOW_WAIT_BUFFER_MS: u64 = 100;
}

/// Retry configuration for provider throttling
pub mod retry {
    /// Dispatch attempts allowed per work item before a rate-limit failure
    /// becomes terminal
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Pause of the whole queue after a rate-limit rejection (seconds)
    pub const RATE_LIMIT_COOLDOWN_SECONDS: u64 = 60;

    /// Lowercase phrases that mark an error message as provider throttling
    pub const RATE_LIMIT_PHRASES: &[&str] = &["rate limit", "too many requests"];
}

/// Environment variable names
pub mod env_vars {
    /// Provider base URL override
    pub const API_BASE_URL: &str = "API_FOOTBALL_BASE_URL";

    /// Provider API key
    pub const API_KEY: &str = "API_FOOTBALL_KEY";

    /// Log file path override
    pub const LOG_FILE: &str = "FIXTURE_DISPATCH_LOG_FILE";

    /// HTTP timeout override in seconds
    pub const HTTP_TIMEOUT: &str = "FIXTURE_DISPATCH_HTTP_TIMEOUT";

    /// Per-minute request budget override
    pub const MAX_PER_MINUTE: &str = "FIXTURE_DISPATCH_MAX_PER_MINUTE";
}
