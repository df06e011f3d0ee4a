use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// Returns true when the arguments ask for a persistent configuration change
pub fn is_config_update(args: &Args) -> bool {
    args.new_api_base_url.is_some()
        || args.new_api_key.is_some()
        || args.new_log_file_path.is_some()
        || args.clear_log_file_path
}

/// Football statistics request dispatcher
///
/// Sends requests to a quota-limited football statistics API through a shared
/// dispatch queue. Identical requests are made only once, calls are kept under
/// the per-minute budget, and throttled calls are retried after a cooldown.
///
/// Requests are given as `/endpoint?name=value&name2=value2`, for example:
///
///   fixture_dispatch "/fixtures?league=39&season=2024" "/standings?league=39&season=2024"
///
/// Each result is printed to stdout as one JSON line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
#[command(styles = get_styles())]
pub struct Args {
    /// Requests to dispatch, e.g. "/fixtures/events?fixture=215662"
    #[arg(value_name = "REQUEST")]
    pub requests: Vec<String>,

    /// Print the queue status as JSON after all requests settle
    #[arg(long = "status", short = 's', help_heading = "Output")]
    pub status: bool,

    /// Print compact single-line JSON instead of pretty-printed output
    #[arg(long = "compact", short = 'c', help_heading = "Output")]
    pub compact: bool,

    /// Override the per-minute request budget for this run
    #[arg(long = "max-per-minute", short = 'm', help_heading = "Dispatch")]
    pub max_per_minute: Option<usize>,

    /// Update the API base URL in config
    #[arg(long = "config", value_name = "API_BASE_URL", help_heading = "Configuration")]
    pub new_api_base_url: Option<String>,

    /// Update the API key in config
    #[arg(long = "set-api-key", value_name = "API_KEY", help_heading = "Configuration")]
    pub new_api_key: Option<String>,

    /// Update log file path in config. This sets a persistent custom log file location.
    #[arg(long = "set-log-file", help_heading = "Configuration")]
    pub new_log_file_path: Option<String>,

    /// Clear the custom log file path from config. This reverts to using the default log location.
    #[arg(long = "clear-log-file", help_heading = "Configuration")]
    pub clear_log_file_path: bool,

    /// List current configuration settings
    #[arg(long = "list-config", short = 'l', help_heading = "Configuration")]
    pub list_config: bool,

    /// Also write logs to stderr.
    #[arg(long = "debug", help_heading = "Debug")]
    pub debug: bool,

    /// Specify a custom log file path. If not provided, logs will be written to the default location.
    #[arg(long = "log-file", help_heading = "Debug")]
    pub log_file: Option<String>,
}
