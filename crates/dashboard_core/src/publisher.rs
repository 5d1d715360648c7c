//! Publisher screen: compose an event and watch the list of published events.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;
use webhook_client::models::{EventDraft, EventStatus, HttpMethod, WebhookEvent};
use webhook_client::{Error, WebhookApi};

use crate::Loadable;

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;

/// Header text the form starts with.
pub const DEFAULT_HEADERS: &str = r#"{"Content-Type": "application/json"}"#;

/// Payload text the form starts with.
pub const DEFAULT_PAYLOAD: &str = r#"{"event": "test", "data": {}}"#;

/// Returns true when the backend would accept another delivery attempt.
pub fn can_retry(event: &WebhookEvent) -> bool {
    event.status == EventStatus::Failed && event.attempts < event.max_attempts
}

/// Raw text fields of the publish form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishForm {
    pub url: String,
    pub method: HttpMethod,
    /// JSON object of header names to values
    pub headers: String,
    /// Any JSON value
    pub payload: String,
}

impl Default for PublishForm {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::Post,
            headers: DEFAULT_HEADERS.to_string(),
            payload: DEFAULT_PAYLOAD.to_string(),
        }
    }
}

impl PublishForm {
    /// Turns the form into a draft.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the URL is missing or not absolute,
    /// or when the headers or payload text is not valid JSON.
    pub fn to_draft(&self) -> Result<EventDraft, Error> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(Error::Validation("URL is required".to_string()));
        }
        Url::parse(url).map_err(|_| Error::Validation(format!("Invalid URL '{url}'")))?;

        let headers = parse_headers(&self.headers)?;
        let payload: Value = serde_json::from_str(&self.payload)
            .map_err(|_| Error::Validation("Invalid JSON in payload".to_string()))?;

        Ok(EventDraft::new(url, self.method)
            .with_headers(headers)
            .with_payload(payload))
    }
}

fn parse_headers(text: &str) -> Result<BTreeMap<String, String>, Error> {
    let invalid = || Error::Validation("Invalid JSON in headers".to_string());
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    match serde_json::from_str::<Value>(text).map_err(|_| invalid())? {
        Value::Object(fields) => fields
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(s) => Ok((name, s)),
                Value::Number(n) => Ok((name, n.to_string())),
                Value::Bool(b) => Ok((name, b.to_string())),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

/// View model of the publisher screen.
pub struct PublisherView {
    api: Arc<dyn WebhookApi>,
    pub form: PublishForm,
    events: Loadable<Vec<WebhookEvent>>,
}

impl PublisherView {
    pub fn new(api: Arc<dyn WebhookApi>) -> Self {
        Self {
            api,
            form: PublishForm::default(),
            events: Loadable::Loading,
        }
    }

    pub async fn load(&mut self) {
        let result = self.api.get_events().await;
        if let Err(e) = &result {
            warn!(error = %e, "Failed to fetch events");
        }
        self.events.apply(result);
    }

    pub fn events(&self) -> &Loadable<Vec<WebhookEvent>> {
        &self.events
    }

    /// Publishes the form contents.
    ///
    /// On success the form is reset and the event list fetched again. On
    /// failure the form and the list are left as they were.
    #[instrument(skip(self), fields(url = %self.form.url))]
    pub async fn publish(&mut self) -> Result<WebhookEvent, Error> {
        let draft = self.form.to_draft()?;
        let event = self.api.publish_event(&draft).await?;

        info!(event_id = event.id.as_str(), "Published event from form");
        self.form = PublishForm::default();
        self.load().await;
        Ok(event)
    }

    /// Retries an event and refreshes the list.
    pub async fn retry(&mut self, id: &str) -> Result<WebhookEvent, Error> {
        let event = self.api.retry_event(id).await?;
        self.load().await;
        Ok(event)
    }
}
