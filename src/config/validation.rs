use super::Config;
use crate::error::AppError;
use std::path::Path;

/// Validates the configuration settings
///
/// # Returns
/// * `Ok(())` - Configuration is valid
/// * `Err(AppError)` - Configuration validation failed
///
/// # Validation Rules
/// - API base URL cannot be empty and must look like a URL or domain name
/// - HTTP timeout and per-minute request budget must be non-zero
/// - If log file path is provided, it cannot be empty and its parent
///   directory must exist or be creatable
pub fn validate_config(config: &Config) -> Result<(), AppError> {
    let base_url = config.api_base_url.as_str();
    if base_url.is_empty() {
        return Err(AppError::config_error("API base URL cannot be empty"));
    }

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        // Without a scheme it should at least look like a domain
        if !base_url.contains('.') && !base_url.starts_with("localhost") {
            return Err(AppError::config_error(
                "API base URL must be a valid URL or domain name",
            ));
        }
    }

    if config.http_timeout_seconds == 0 {
        return Err(AppError::config_error("HTTP timeout must be at least 1 second"));
    }

    if config.max_requests_per_minute == 0 {
        return Err(AppError::config_error(
            "Requests per minute must be at least 1",
        ));
    }

    if let Some(log_path) = &config.log_file_path {
        if log_path.is_empty() {
            return Err(AppError::config_error("Log file path cannot be empty"));
        }

        if let Some(parent) = Path::new(log_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config_error(format!(
                    "Cannot create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
