use std::sync::Arc;
use thiserror::Error;

use crate::constants::retry::RATE_LIMIT_PHRASES;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to fetch data from API: {0}")]
    ApiFetch(#[from] reqwest::Error),

    #[error("Failed to parse API response: {0}")]
    ApiParse(#[from] serde_json::Error),

    // Specific HTTP status code errors
    #[error("API request not found (404): {url}")]
    ApiNotFound { url: String },

    #[error("API server error ({status}): {message} (URL: {url})")]
    ApiServerError {
        status: u16,
        message: String,
        url: String,
    },

    #[error("API client error ({status}): {message} (URL: {url})")]
    ApiClientError {
        status: u16,
        message: String,
        url: String,
    },

    #[error("API rate limit exceeded (429): {message} (URL: {url})")]
    ApiRateLimit { message: String, url: String },

    #[error("API service unavailable ({status}): {message} (URL: {url})")]
    ApiServiceUnavailable {
        status: u16,
        message: String,
        url: String,
    },

    // Network-specific errors
    #[error("Network timeout while fetching data from: {url}")]
    NetworkTimeout { url: String },

    #[error("Connection failed to: {url} - {message}")]
    NetworkConnection { url: String, message: String },

    // Data parsing errors
    #[error("API returned malformed JSON: {message} (URL: {url})")]
    ApiMalformedJson { message: String, url: String },

    #[error("API returned empty or missing data: {message} (URL: {url})")]
    ApiNoData { message: String, url: String },

    // Dispatch queue errors
    /// One terminal failure delivered to several waiters of the same key.
    #[error(transparent)]
    Shared(Arc<AppError>),

    #[error("Dispatch of '{key}' ended without an outcome")]
    DispatchAborted { key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Log setup error: {0}")]
    LogSetup(String),

    /// Failure raised by a caller-supplied operation that is not an HTTP error.
    #[error("{0}")]
    Operation(String),
}

impl AppError {
    /// Create a configuration error with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a log setup error with context
    pub fn log_setup_error(msg: impl Into<String>) -> Self {
        Self::LogSetup(msg.into())
    }

    /// Create an operation error with a plain message
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create an API not found error
    pub fn api_not_found(url: impl Into<String>) -> Self {
        Self::ApiNotFound { url: url.into() }
    }

    /// Create an API server error (5xx status codes)
    pub fn api_server_error(
        status: u16,
        message: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::ApiServerError {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an API client error (4xx status codes except 404 and 429)
    pub fn api_client_error(
        status: u16,
        message: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::ApiClientError {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an API rate limit error
    pub fn api_rate_limit(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiRateLimit {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an API service unavailable error
    pub fn api_service_unavailable(
        status: u16,
        message: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::ApiServiceUnavailable {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create a network timeout error
    pub fn network_timeout(url: impl Into<String>) -> Self {
        Self::NetworkTimeout { url: url.into() }
    }

    /// Create a network connection error
    pub fn network_connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NetworkConnection {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a malformed JSON error
    pub fn api_malformed_json(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiMalformedJson {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create a no data error
    pub fn api_no_data(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiNoData {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an error for a waiter whose work item vanished without an outcome
    pub fn dispatch_aborted(key: impl Into<String>) -> Self {
        Self::DispatchAborted { key: key.into() }
    }

    /// HTTP status code carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::ApiNotFound { .. } => Some(404),
            AppError::ApiRateLimit { .. } => Some(429),
            AppError::ApiServerError { status, .. }
            | AppError::ApiClientError { status, .. }
            | AppError::ApiServiceUnavailable { status, .. } => Some(*status),
            AppError::ApiFetch(e) => e.status().map(|s| s.as_u16()),
            AppError::Shared(inner) => inner.status_code(),
            _ => None,
        }
    }

    /// Check if the error signals provider throttling.
    ///
    /// True for status 429 or when the message contains one of the fixed
    /// rate-limit phrases (ASCII case-insensitive). The phrase match is
    /// deliberately broad and may classify some permanent errors as transient.
    pub fn is_rate_limited(&self) -> bool {
        if self.status_code() == Some(429) {
            return true;
        }

        let message = self.to_string().to_ascii_lowercase();
        RATE_LIMIT_PHRASES
            .iter()
            .any(|phrase| message.contains(phrase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_helper() {
        let error = AppError::config_error("Invalid configuration");
        assert!(matches!(error, AppError::Config(_)));
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration"
        );
    }

    #[test]
    fn test_log_setup_error_helper() {
        let error = AppError::log_setup_error("Failed to initialize logger");
        assert!(matches!(error, AppError::LogSetup(_)));
        assert_eq!(
            error.to_string(),
            "Log setup error: Failed to initialize logger"
        );
    }

    #[test]
    fn test_api_rate_limit_helper() {
        let error = AppError::api_rate_limit("Too many requests", "https://api.example.com");
        assert!(matches!(error, AppError::ApiRateLimit { .. }));
        assert_eq!(
            error.to_string(),
            "API rate limit exceeded (429): Too many requests (URL: https://api.example.com)"
        );
    }

    #[test]
    fn test_api_client_error_helper() {
        let error = AppError::api_client_error(400, "Bad request", "https://api.example.com");
        assert!(matches!(error, AppError::ApiClientError { .. }));
        assert_eq!(
            error.to_string(),
            "API client error (400): Bad request (URL: https://api.example.com)"
        );
    }

    #[test]
    fn test_network_connection_helper() {
        let error = AppError::network_connection("https://api.example.com", "Connection refused");
        assert!(matches!(error, AppError::NetworkConnection { .. }));
        assert_eq!(
            error.to_string(),
            "Connection failed to: https://api.example.com - Connection refused"
        );
    }

    #[test]
    fn test_status_code() {
        assert_eq!(AppError::api_not_found("url").status_code(), Some(404));
        assert_eq!(AppError::api_rate_limit("m", "url").status_code(), Some(429));
        assert_eq!(
            AppError::api_server_error(500, "m", "url").status_code(),
            Some(500)
        );
        assert_eq!(
            AppError::api_service_unavailable(503, "m", "url").status_code(),
            Some(503)
        );
        assert_eq!(AppError::network_timeout("url").status_code(), None);
        assert_eq!(AppError::operation("bad input").status_code(), None);
    }

    #[test]
    fn test_is_rate_limited_by_status() {
        assert!(AppError::api_rate_limit("slow down", "url").is_rate_limited());
        // A 429 reported through the generic client variant still counts
        assert!(AppError::api_client_error(429, "whatever", "url").is_rate_limited());
    }

    #[test]
    fn test_is_rate_limited_by_message() {
        assert!(AppError::operation("provider rate limit reached").is_rate_limited());
        assert!(AppError::operation("Too Many Requests").is_rate_limited());
        assert!(
            AppError::api_server_error(500, "Rate Limit exceeded upstream", "url")
                .is_rate_limited()
        );
    }

    #[test]
    fn test_is_not_rate_limited() {
        let permanent = vec![
            AppError::api_not_found("url"),
            AppError::api_client_error(400, "Bad request", "url"),
            AppError::api_server_error(500, "Internal server error", "url"),
            AppError::api_service_unavailable(503, "Service unavailable", "url"),
            AppError::network_timeout("url"),
            AppError::network_connection("url", "Connection refused"),
            AppError::api_malformed_json("Response is not valid JSON", "url"),
            AppError::operation("season must be a four digit year"),
            AppError::config_error("invalid config"),
        ];

        for error in permanent {
            assert!(!error.is_rate_limited(), "{error:?} should not be rate limited");
        }
    }

    #[test]
    fn test_shared_error_is_transparent() {
        let inner = Arc::new(AppError::api_rate_limit("Too many requests", "url"));
        let shared = AppError::Shared(inner.clone());

        assert_eq!(shared.to_string(), inner.to_string());
        assert_eq!(shared.status_code(), Some(429));
        assert!(shared.is_rate_limited());
    }

    #[test]
    fn test_dispatch_aborted_helper() {
        let error = AppError::dispatch_aborted("/fixtures?id=7");
        assert_eq!(
            error.to_string(),
            "Dispatch of '/fixtures?id=7' ended without an outcome"
        );
        assert!(!error.is_rate_limited());
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_error: AppError = json_error.into();
        assert!(matches!(app_error, AppError::ApiParse(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert!(matches!(app_error, AppError::Io(_)));
    }

    #[test]
    fn test_error_from_toml_deserialize() {
        let invalid_toml = "invalid = [toml";
        let toml_error = toml::from_str::<serde_json::Value>(invalid_toml).unwrap_err();
        let app_error: AppError = toml_error.into();
        assert!(matches!(app_error, AppError::TomlDeserialize(_)));
    }
}
