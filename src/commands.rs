use crate::cli::Args;
use fixture_dispatch::api_client::{FootballApi, parse_request};
use fixture_dispatch::config::Config;
use fixture_dispatch::error::AppError;
use futures::future::join_all;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Validates command line argument combinations.
///
/// Returns an error if incompatible arguments are used together.
pub fn validate_args(args: &Args) -> Result<(), AppError> {
    if args.new_log_file_path.is_some() && args.clear_log_file_path {
        return Err(AppError::config_error(
            "Cannot use both --set-log-file and --clear-log-file",
        ));
    }
    if args.max_per_minute == Some(0) {
        return Err(AppError::config_error(
            "--max-per-minute must be at least 1",
        ));
    }
    Ok(())
}

/// Handles the --list-config command.
pub async fn handle_list_config_command() -> Result<(), AppError> {
    Config::display().await
}

/// Handles configuration update commands (--config, --set-api-key,
/// --set-log-file, --clear-log-file).
pub async fn handle_config_update_command(args: &Args) -> Result<(), AppError> {
    update_config_file(args, &Config::get_config_path()).await?;
    println!("Config updated successfully!");
    Ok(())
}

/// Rewrites the config file at `path` with the requested changes.
/// Environment overrides are never written back to the file.
async fn update_config_file(args: &Args, path: &str) -> Result<(), AppError> {
    let mut config = Config::load_file(path).await?;

    if let Some(new_url) = &args.new_api_base_url {
        config.api_base_url = new_url.clone();
    }

    if let Some(new_key) = &args.new_api_key {
        config.api_key = Some(new_key.clone());
    }

    if let Some(new_log_path) = &args.new_log_file_path {
        config.log_file_path = Some(new_log_path.clone());
    } else if args.clear_log_file_path {
        config.log_file_path = None;
        println!("Custom log file path cleared. Using default location.");
    }

    config.validate()?;
    config.save_to_path(path).await
}

/// Dispatches every request concurrently through one queue and prints one
/// JSON line per request, in the order given.
///
/// Returns an error when at least one request failed, after printing all.
pub async fn handle_requests_command(args: &Args, mut config: Config) -> Result<(), AppError> {
    if let Some(budget) = args.max_per_minute {
        config.max_requests_per_minute = budget;
    }

    let parsed = args
        .requests
        .iter()
        .map(|spec| parse_request(spec).map(|request| (spec.as_str(), request)))
        .collect::<Result<Vec<_>, _>>()?;

    let api = FootballApi::from_config(&config)?;
    info!(
        "Dispatching {} request(s) with budget {}/min",
        parsed.len(),
        config.max_requests_per_minute
    );

    let outcomes = join_all(parsed.into_iter().map(|(spec, (endpoint, params))| {
        let api = api.clone();
        async move { (spec, api.request(&endpoint, params).await) }
    }))
    .await;

    let mut failed = 0usize;
    for (spec, outcome) in outcomes {
        let line = match outcome {
            Ok(body) => json!({ "request": spec, "result": body }),
            Err(e) => {
                failed += 1;
                warn!("Request {} failed: {}", spec, e);
                json!({ "request": spec, "error": e.to_string() })
            }
        };
        print_json(&line, args.compact)?;
    }

    if args.status {
        let status = serde_json::to_value(api.queue_status())?;
        print_json(&json!({ "status": status }), args.compact)?;
    }

    if failed > 0 {
        return Err(AppError::operation(format!(
            "{failed} of {} request(s) failed",
            args.requests.len()
        )));
    }
    Ok(())
}

fn print_json(value: &Value, compact: bool) -> Result<(), AppError> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}
