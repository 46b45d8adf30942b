//! featbal CLI — CI gate for feature-importance balance.
//!
//! Exit status: 0 when every check passes, 1 when a check fails, 2 when the
//! input or configuration is unusable.

mod commands;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// featbal: fail the build when a model leans on too few features
#[derive(Parser, Debug)]
#[command(name = "featbal", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for JSON log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Audit an importance vector stored as JSON
    Audit(AuditArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Default)]
struct AuditArgs {
    /// JSON file with `names`/`values` arrays or an `importances` map
    file: PathBuf,

    /// Override max_share_upper
    #[arg(long)]
    max_share: Option<f64>,

    /// Override top2_share_upper
    #[arg(long)]
    top2_share: Option<f64>,

    /// Override min_share_lower
    #[arg(long)]
    min_share: Option<f64>,

    /// Override stddev_lower
    #[arg(long)]
    stddev_lower: Option<f64>,

    /// Override stddev_upper
    #[arg(long)]
    stddev_upper: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Print the resolved configuration as TOML
    Show,
    /// Write the default configuration to a file
    Init {
        /// Destination path
        #[arg(default_value = "featbal.toml")]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.quiet, cli.log_dir.as_deref());

    let mut stdout = std::io::stdout().lock();
    let result = commands::handle_command(cli.command, cli.config.as_deref(), &mut stdout);
    if let Err(e) = &result {
        eprintln!("Error: {e:#}");
    }
    ExitCode::from(commands::exit_status(&result))
}

/// Human-readable stderr logging, plus JSON file logging when a directory
/// is given. The returned guard flushes the file writer on drop.
fn init_tracing(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let (json_layer, guard) = match log_dir {
        Some(dir) => {
            let _ = std::fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::daily(dir, "featbal.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}
