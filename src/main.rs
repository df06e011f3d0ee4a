// src/main.rs
mod cli;
mod commands;
mod logging;

use clap::{CommandFactory, Parser};
use cli::{Args, is_config_update};
use fixture_dispatch::config::Config;
use fixture_dispatch::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    commands::validate_args(&args)?;

    // Config may be missing or invalid here; logging falls back to defaults
    let config = Config::load().await;
    let (log_file_path, _guard) = logging::setup_logging(&args, config.as_ref().ok()).await?;
    tracing::info!("Logs are being written to: {log_file_path}");

    if args.list_config {
        return commands::handle_list_config_command().await;
    }

    if is_config_update(&args) {
        return commands::handle_config_update_command(&args).await;
    }

    if args.requests.is_empty() {
        Args::command().print_help()?;
        return Ok(());
    }

    commands::handle_requests_command(&args, config?).await
}
