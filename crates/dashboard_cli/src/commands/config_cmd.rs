use clap::Subcommand;
use tracing::{debug, error, info, instrument};

use crate::config::{get_config_path, AppConfig};
use crate::errors::Error;
use crate::output::{to_json, OutputFormat};

#[cfg(test)]
#[path = "config_cmd_tests.rs"]
mod tests;

/// Subcommands for the config command
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Create initial configuration file
    Init {
        /// Path to save the configuration file
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Show the configuration in effect, environment overrides included
    Show,
}

/// Execute the config command
#[instrument]
pub fn execute(
    cmd: ConfigCommands,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<String, Error> {
    match cmd {
        ConfigCommands::Init { path } => init_config(path.as_deref().or(config_path)),
        ConfigCommands::Show => show_config(config_path, format),
    }
}

/// Initialize a new configuration file
fn init_config(path: Option<&str>) -> Result<String, Error> {
    let config_path = get_config_path(path);
    debug!(message = "Initializing configuration", path = ?config_path);

    if config_path.exists() {
        let err = Error::Config(format!(
            "Configuration file already exists at {:?}",
            config_path
        ));
        error!(message = "Configuration file already exists", path = ?config_path);
        return Err(err);
    }

    AppConfig::default().save(&config_path)?;

    info!(message = "Configuration initialized", path = ?config_path);
    Ok(format!("Configuration initialized at {:?}", config_path))
}

fn show_config(path: Option<&str>, format: OutputFormat) -> Result<String, Error> {
    let config = AppConfig::load_effective(path)?.redacted();
    match format {
        OutputFormat::Json => to_json(&config),
        OutputFormat::Pretty => toml::to_string_pretty(&config)
            .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e))),
    }
}
