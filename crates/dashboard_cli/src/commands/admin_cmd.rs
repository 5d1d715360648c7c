use clap::Subcommand;
use dashboard_core::{AdminView, LoginForm, RegistrationForm};
use secrecy::SecretString;
use tracing::instrument;
use webhook_client::models::Admin;

use crate::commands::{ask_user_for_value, Context};
use crate::errors::Error;
use crate::output::{format_timestamp, heading, to_json};

#[cfg(test)]
#[path = "admin_cmd_tests.rs"]
mod tests;

/// Subcommands for the admin command
#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommands {
    /// Register a new administrator
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Check administrator credentials
    Login {
        #[arg(long)]
        email: String,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

/// Execute the admin command
#[instrument(skip(context, cmd))]
pub async fn execute(cmd: AdminCommands, context: &Context) -> Result<String, Error> {
    let mut view = AdminView::new(context.api.clone());
    match cmd {
        AdminCommands::Register {
            email,
            name,
            password,
        } => {
            let form = RegistrationForm {
                email,
                name,
                password: password_or_prompt(password)?,
            };
            let admin = view.register(&form).await?;
            render(context, "Registered", &admin)
        }
        AdminCommands::Login { email, password } => {
            let form = LoginForm {
                email,
                password: password_or_prompt(password)?,
            };
            view.login(&form).await?;
            match view.session() {
                Some(admin) => render(context, "Logged in as", admin),
                None => Err(Error::Unavailable("login returned no session".to_string())),
            }
        }
    }
}

fn password_or_prompt(password: Option<String>) -> Result<SecretString, Error> {
    let password = match password {
        Some(password) => password,
        None => ask_user_for_value("Password: ")?,
    };
    Ok(SecretString::from(password))
}

fn render(context: &Context, action: &str, admin: &Admin) -> Result<String, Error> {
    if context.is_json() {
        return to_json(admin);
    }
    let last_login = admin
        .last_login
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| "never".to_string());
    Ok([
        heading(&format!("{} {} <{}>", action, admin.name, admin.email)),
        format!("  ID:         {}", admin.id),
        format!("  Role:       {}", admin.role.as_str()),
        format!("  Created:    {}", format_timestamp(&admin.created_at)),
        format!("  Last login: {}", last_login),
    ]
    .join("\n"))
}
