//! Command modules for the webhook dashboard CLI.
//!
//! Each submodule renders one screen of the dashboard:
//!
//! - `overview_cmd`: headline counters and the latest events
//! - `stats_cmd`: success/retry rates and the status chart
//! - `events_cmd`: publishing, monitoring, retrying and exporting events
//! - `subscriptions_cmd`: managing subscriptions
//! - `admin_cmd`: administrator registration and login
//! - `config_cmd`: creating and inspecting the configuration file
//!
//! Commands return the text to print rather than printing it themselves.

use std::io::{self, Write};
use std::sync::Arc;

use dashboard_core::{Loadable, ViewTask};
use tracing::info;
use webhook_client::{MemoryWebhookApi, WebhookApi, WebhookClient};

use crate::config::AppConfig;
use crate::errors::Error;
use crate::output::OutputFormat;

pub mod admin_cmd;
pub mod config_cmd;
pub mod events_cmd;
pub mod overview_cmd;
pub mod stats_cmd;
pub mod subscriptions_cmd;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

/// Backend handle and output settings shared by all commands.
pub struct Context {
    pub api: Arc<dyn WebhookApi>,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(api: Arc<dyn WebhookApi>, format: OutputFormat) -> Self {
        Self { api, format }
    }

    /// Context backed by the in-memory demo backend.
    pub fn standalone(format: OutputFormat) -> Self {
        Self::new(Arc::new(MemoryWebhookApi::with_demo_data()), format)
    }

    /// Connects to the configured backend, or the demo backend when
    /// `standalone` is set.
    pub fn connect(config: &AppConfig, standalone: bool, format: OutputFormat) -> Result<Self, Error> {
        if standalone {
            info!("Using the in-memory demo backend");
            return Ok(Self::standalone(format));
        }
        let client = WebhookClient::new(config.client_config()?)?;
        Ok(Self::new(Arc::new(client), format))
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Returns the loaded data or the reason it could not be loaded.
pub(crate) fn loaded<T>(loadable: &Loadable<T>) -> Result<&T, Error> {
    match loadable {
        Loadable::Ready(data) => Ok(data),
        Loadable::Failed(message) => Err(Error::Unavailable(message.clone())),
        Loadable::Loading => Err(Error::Unavailable("no data was loaded".to_string())),
    }
}

/// Waits for a background fetch started by a view.
///
/// The task is aborted if this future is dropped, e.g. on Ctrl-C.
pub(crate) async fn finish<T: Send + 'static>(task: ViewTask<T>) -> Result<T, Error> {
    task.join().await.ok_or(Error::Cancelled)
}

/// Prompts on stdout and reads one trimmed line from stdin.
pub fn ask_user_for_value(request: &str) -> Result<String, Error> {
    print!("{}", request);
    io::stdout().flush().map_err(|_| Error::StdOutFlushFailed)?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .map_err(|_| Error::StdInReadFailed)?;
    Ok(answer.trim().to_string())
}

/// Asks a yes/no question. Anything but `y` or `yes` means no.
pub fn confirm(question: &str) -> Result<bool, Error> {
    let answer = ask_user_for_value(&format!("{} [y/N] ", question))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
