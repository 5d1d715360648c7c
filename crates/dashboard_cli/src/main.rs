use clap::{Parser, Subcommand};
use dashboard_cli::commands::admin_cmd::{self, AdminCommands};
use dashboard_cli::commands::config_cmd::{self, ConfigCommands};
use dashboard_cli::commands::events_cmd::{self, EventsCommands};
use dashboard_cli::commands::subscriptions_cmd::{self, SubscriptionsCommands};
use dashboard_cli::commands::{overview_cmd, stats_cmd, Context};
use dashboard_cli::config::AppConfig;
use dashboard_cli::errors::Error;
use dashboard_cli::output::OutputFormat;
use dashboard_core::TimeRange;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Webhook dashboard CLI: inspect and manage webhook events and subscriptions
#[derive(Parser)]
#[command(name = "webhook-dashboard")]
#[command(about = "Inspect and manage webhook events and subscriptions", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Use the built-in demo backend instead of a server
    #[arg(long, global = true)]
    standalone: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show headline counters and the latest events
    Overview,

    /// Show success and retry rates and the status distribution
    Stats {
        /// Time range: 24h, 7d or 30d
        #[arg(long, default_value = "7d")]
        range: TimeRange,
    },

    #[command(subcommand)]
    Events(EventsCommands),

    #[command(subcommand)]
    Subscriptions(SubscriptionsCommands),

    #[command(subcommand)]
    Admin(AdminCommands),

    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show the CLI version
    Version,
}

async fn run(cli: Cli) -> Result<String, Error> {
    let Cli {
        config,
        standalone,
        format,
        command,
    } = cli;
    let connect = || {
        let app_config = AppConfig::load_effective(config.as_deref())?;
        Context::connect(&app_config, standalone, format)
    };

    match command {
        Commands::Overview => overview_cmd::execute(&connect()?).await,
        Commands::Stats { range } => stats_cmd::execute(&connect()?, range).await,
        Commands::Events(cmd) => events_cmd::execute(cmd, &connect()?).await,
        Commands::Subscriptions(cmd) => subscriptions_cmd::execute(cmd, &connect()?).await,
        Commands::Admin(cmd) => admin_cmd::execute(cmd, &connect()?).await,
        Commands::Config(cmd) => config_cmd::execute(cmd, config.as_deref(), format),
        Commands::Version => Ok(format!(
            "webhook-dashboard version {}",
            option_env!("WEBHOOK_DASHBOARD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
        )),
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("WEBHOOK_DASHBOARD_LOG"))
        .init();

    let cli = Cli::parse();

    // Dropping the command future aborts any request still in flight
    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            Err(Error::Cancelled)
        }
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            error!("Error: {e}");
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
