//! HTTP client creation and configuration utilities

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

use crate::constants::{API_KEY_HEADER, HTTP_POOL_MAX_IDLE_PER_HOST};
use crate::error::AppError;

/// Creates an HTTP client with connection pooling, a request timeout and the
/// provider API key sent as a default header.
///
/// # Arguments
/// * `timeout_seconds` - Per-request timeout
/// * `api_key` - Provider key; omitted from requests when `None` or empty
///
/// # Returns
/// * `Result<Client, AppError>` - A configured reqwest HTTP client or error
pub fn create_http_client(timeout_seconds: u64, api_key: Option<&str>) -> Result<Client, AppError> {
    let mut headers = HeaderMap::new();
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        let mut value = HeaderValue::from_str(key)
            .map_err(|e| AppError::config_error(format!("Invalid API key: {e}")))?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE_PER_HOST)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Creates an HTTP client for testing with default timeout and no key
#[cfg(test)]
pub fn create_test_http_client() -> Client {
    create_http_client(crate::constants::DEFAULT_HTTP_TIMEOUT_SECONDS, None)
        .expect("Failed to create test HTTP client")
}
