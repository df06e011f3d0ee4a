pub mod fetch_utils;
pub mod football_api;
pub mod http_client;
pub mod urls;

// Re-export the client and URL utilities
pub use football_api::FootballApi;
pub use http_client::create_http_client;
pub use urls::*;
