//! Consumer screen: manage the subscriptions that receive webhooks.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use webhook_client::models::{
    normalize_event_names, SubscriptionDraft, SubscriptionUpdate, WebhookSubscription,
};
use webhook_client::{Error, WebhookApi};

use crate::Loadable;

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;

/// Prefix of every generated signing secret.
pub const SECRET_PREFIX: &str = "webhook_";

const SECRET_RANDOM_LEN: usize = 16;

const SECRET_ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a signing secret: `webhook_` followed by 16 random lower-case
/// alphanumerics.
pub fn generate_secret() -> String {
    let mut random = uuid::Uuid::new_v4().as_u128();
    let suffix: String = (0..SECRET_RANDOM_LEN)
        .map(|_| {
            let c = SECRET_ALPHABET[(random % 36) as usize];
            random /= 36;
            c as char
        })
        .collect();
    format!("{SECRET_PREFIX}{suffix}")
}

/// Subscription form with a growable list of event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionForm {
    pub name: String,
    pub url: String,
    events: Vec<String>,
    pub secret: String,
}

impl Default for SubscriptionForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            events: vec![String::new()],
            secret: String::new(),
        }
    }
}

impl SubscriptionForm {
    /// Fills the form from an existing subscription.
    pub fn from_subscription(subscription: &WebhookSubscription) -> Self {
        let events = if subscription.events.is_empty() {
            vec![String::new()]
        } else {
            subscription.events.clone()
        };
        Self {
            name: subscription.name.clone(),
            url: subscription.url.clone(),
            events,
            secret: subscription.secret.clone(),
        }
    }

    /// Event fields as typed, blanks included.
    pub fn event_fields(&self) -> &[String] {
        &self.events
    }

    pub fn add_event_field(&mut self) {
        self.events.push(String::new());
    }

    /// Replaces the text of one event field. Out-of-range indexes are ignored.
    pub fn update_event_field(&mut self, index: usize, value: impl Into<String>) {
        if let Some(field) = self.events.get_mut(index) {
            *field = value.into();
        }
    }

    /// Removes one event field. The last remaining field is never removed.
    pub fn remove_event_field(&mut self, index: usize) -> bool {
        if self.events.len() <= 1 || index >= self.events.len() {
            return false;
        }
        self.events.remove(index);
        true
    }

    pub fn generate_secret(&mut self) {
        self.secret = generate_secret();
    }

    /// Event names the form would submit.
    pub fn events(&self) -> Vec<String> {
        normalize_event_names(&self.events)
    }

    /// Checks the form before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when name or URL is blank or no event
    /// name remains after trimming.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Name is required".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(Error::Validation("URL is required".to_string()));
        }
        if self.events().is_empty() {
            return Err(Error::Validation(
                "At least one event is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_draft(&self) -> Result<SubscriptionDraft, Error> {
        self.validate()?;
        Ok(SubscriptionDraft {
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
            events: self.events(),
            secret: self.secret.clone(),
            is_active: true,
        })
    }

    pub fn to_update(&self) -> Result<SubscriptionUpdate, Error> {
        self.validate()?;
        Ok(SubscriptionUpdate::default()
            .name(self.name.trim())
            .url(self.url.trim())
            .events(self.events())
            .secret(self.secret.clone()))
    }
}

/// View model of the consumer screen.
pub struct ConsumerView {
    api: Arc<dyn WebhookApi>,
    subscriptions: Loadable<Vec<WebhookSubscription>>,
    pub form: SubscriptionForm,
    editing: Option<String>,
}

impl ConsumerView {
    pub fn new(api: Arc<dyn WebhookApi>) -> Self {
        Self {
            api,
            subscriptions: Loadable::Loading,
            form: SubscriptionForm::default(),
            editing: None,
        }
    }

    pub async fn load(&mut self) {
        let result = self.api.get_subscriptions().await;
        if let Err(e) = &result {
            warn!(error = %e, "Failed to fetch subscriptions");
        }
        self.subscriptions.apply(result);
    }

    pub fn subscriptions(&self) -> &Loadable<Vec<WebhookSubscription>> {
        &self.subscriptions
    }

    /// Id of the subscription being edited, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Loads a subscription into the form for editing.
    pub fn edit(&mut self, subscription: &WebhookSubscription) {
        self.form = SubscriptionForm::from_subscription(subscription);
        self.editing = Some(subscription.id.clone());
    }

    pub fn reset_form(&mut self) {
        self.form = SubscriptionForm::default();
        self.editing = None;
    }

    /// Creates or updates a subscription from the form.
    ///
    /// On success the form is reset and the list fetched again.
    #[instrument(skip(self), fields(editing = ?self.editing))]
    pub async fn submit(&mut self) -> Result<WebhookSubscription, Error> {
        let saved = match &self.editing {
            Some(id) => {
                let update = self.form.to_update()?;
                self.api.update_subscription(id, &update).await?
            }
            None => {
                let draft = self.form.to_draft()?;
                self.api.create_subscription(&draft).await?
            }
        };

        info!(subscription_id = saved.id.as_str(), "Saved subscription");
        self.reset_form();
        self.load().await;
        Ok(saved)
    }

    /// Flips `is_active` on a subscription.
    pub async fn toggle_active(
        &mut self,
        subscription: &WebhookSubscription,
    ) -> Result<WebhookSubscription, Error> {
        let update = SubscriptionUpdate::default().active(!subscription.is_active);
        let updated = self
            .api
            .update_subscription(&subscription.id, &update)
            .await?;
        self.load().await;
        Ok(updated)
    }

    /// Deletes a subscription. One that is already gone counts as deleted.
    pub async fn delete(&mut self, id: &str) -> Result<(), Error> {
        match self.api.delete_subscription(id).await {
            Ok(()) => {}
            Err(Error::NotFound(_)) => {
                debug!(subscription_id = id, "Subscription already removed");
            }
            Err(e) => return Err(e),
        }
        if self.editing.as_deref() == Some(id) {
            self.reset_form();
        }
        self.load().await;
        Ok(())
    }
}
