//! Admin screen: registration, login and the current session.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};
use webhook_client::models::{Admin, AdminRegistration};
use webhook_client::{Error, WebhookApi};

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;

fn validate_email(email: &str) -> Result<(), Error> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid email address '{email}'")))
    }
}

fn require_password(password: &SecretString) -> Result<(), Error> {
    if password.expose_secret().is_empty() {
        return Err(Error::Validation("Password is required".to_string()));
    }
    Ok(())
}

/// Fields of the registration form.
#[derive(Debug)]
pub struct RegistrationForm {
    pub email: String,
    pub name: String,
    pub password: SecretString,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), Error> {
        validate_email(&self.email)?;
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Name is required".to_string()));
        }
        require_password(&self.password)
    }

    fn to_registration(&self) -> AdminRegistration {
        AdminRegistration {
            email: self.email.trim().to_string(),
            name: self.name.trim().to_string(),
            password: SecretString::from(self.password.expose_secret().to_string()),
        }
    }
}

/// Fields of the login form.
#[derive(Debug)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), Error> {
        validate_email(&self.email)?;
        require_password(&self.password)
    }
}

/// View model of the admin screen. Holds the logged-in administrator.
pub struct AdminView {
    api: Arc<dyn WebhookApi>,
    session: Option<Admin>,
}

impl AdminView {
    pub fn new(api: Arc<dyn WebhookApi>) -> Self {
        Self { api, session: None }
    }

    pub fn session(&self) -> Option<&Admin> {
        self.session.as_ref()
    }

    /// Registers an administrator. The session is not changed.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&mut self, form: &RegistrationForm) -> Result<Admin, Error> {
        form.validate()?;
        let admin = self.api.register_admin(&form.to_registration()).await?;
        info!(admin_id = admin.id.as_str(), "Administrator registered");
        Ok(admin)
    }

    /// Logs in and keeps the administrator as the session.
    ///
    /// A failed login leaves any existing session in place.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn login(&mut self, form: &LoginForm) -> Result<Admin, Error> {
        form.validate()?;
        match self
            .api
            .login_admin(form.email.trim(), form.password.expose_secret())
            .await
        {
            Ok(admin) => {
                info!(admin_id = admin.id.as_str(), "Administrator logged in");
                self.session = Some(admin.clone());
                Ok(admin)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) {
        self.session = None;
    }
}
