//! Crate for talking to the webhook-management backend.
//!
//! [`WebhookApi`] is the facade every dashboard view goes through. It owns
//! URL construction, the HTTP Basic header, the JSON double-encoding of event
//! headers and payloads, and error normalization: every operation either
//! succeeds or fails with exactly one [`Error`] variant.
//!
//! Two implementations are provided:
//!
//! - [`WebhookClient`] issues one HTTP request per call against a configured
//!   base URL.
//! - [`MemoryWebhookApi`] keeps everything in process, for standalone use and
//!   for tests.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub mod auth;
pub mod config;
pub mod errors;
pub mod memory;
pub mod models;
pub mod wire;

pub use auth::BasicCredentials;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use errors::Error;
pub use memory::MemoryWebhookApi;

use models::{
    Admin, AdminRegistration, EventDraft, Page, PageQuery, SubscriptionDraft,
    SubscriptionUpdate, WebhookEvent, WebhookStats, WebhookSubscription,
};
use secrecy::ExposeSecret;
use wire::{
    AdminResource, EventResource, LoginRequest, PageResource, RegisterRequest, StatsResource,
    SubscriptionResource,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Operations the dashboard performs against the webhook backend.
///
/// Implementations hold no state that outlives a call; the backend is the
/// source of truth.
#[async_trait]
pub trait WebhookApi: Send + Sync {
    /// Publishes a new event.
    ///
    /// # Errors
    ///
    /// Returns `Error::Request` carrying the status and backend message when
    /// the backend rejects the draft.
    async fn publish_event(&self, draft: &EventDraft) -> Result<WebhookEvent, Error>;

    /// Lists every event known to the backend. An empty backend yields an
    /// empty list.
    async fn get_events(&self) -> Result<Vec<WebhookEvent>, Error>;

    /// Fetches a single event.
    async fn get_event(&self, id: &str) -> Result<WebhookEvent, Error>;

    /// Lists events whose delivery failed.
    async fn get_failed_events(&self) -> Result<Vec<WebhookEvent>, Error>;

    /// Fetches one page of events, newest first.
    ///
    /// A status filter takes precedence over the search text.
    async fn get_events_page(&self, query: &PageQuery) -> Result<Page<WebhookEvent>, Error>;

    /// Requests one more delivery attempt.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no event has this id.
    async fn retry_event(&self, id: &str) -> Result<WebhookEvent, Error>;

    async fn delete_event(&self, id: &str) -> Result<(), Error>;

    async fn get_subscriptions(&self) -> Result<Vec<WebhookSubscription>, Error>;

    async fn get_subscription(&self, id: &str) -> Result<WebhookSubscription, Error>;

    async fn get_active_subscriptions(&self) -> Result<Vec<WebhookSubscription>, Error>;

    /// Lists subscriptions whose name or URL contains `query`, ignoring case.
    async fn search_subscriptions(&self, query: &str) -> Result<Vec<WebhookSubscription>, Error>;

    /// Lists active subscriptions that listen to `event_name`.
    async fn get_subscriptions_by_event(
        &self,
        event_name: &str,
    ) -> Result<Vec<WebhookSubscription>, Error>;

    /// Creates a subscription.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` without issuing a request when the draft
    /// has no non-blank event name.
    async fn create_subscription(
        &self,
        draft: &SubscriptionDraft,
    ) -> Result<WebhookSubscription, Error>;

    /// Applies a partial update. Fields absent from `update` are untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no subscription has this id.
    async fn update_subscription(
        &self,
        id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<WebhookSubscription, Error>;

    /// Removes a subscription.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the backend reports the id as absent.
    async fn delete_subscription(&self, id: &str) -> Result<(), Error>;

    /// Fetches the statistics snapshot. Missing fields degrade to zero.
    async fn get_stats(&self) -> Result<WebhookStats, Error>;

    async fn register_admin(&self, registration: &AdminRegistration) -> Result<Admin, Error>;

    /// Logs an administrator in.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCredentials` when the backend rejects the pair.
    async fn login_admin(&self, email: &str, password: &str) -> Result<Admin, Error>;
}

/// HTTP implementation of [`WebhookApi`].
///
/// # Examples
///
/// ```rust,no_run
/// use secrecy::SecretString;
/// use webhook_client::{BasicCredentials, ClientConfig, WebhookApi, WebhookClient};
///
/// # async fn example() -> Result<(), webhook_client::Error> {
/// let credentials = BasicCredentials::new("admin", SecretString::from("password".to_string()));
/// let config = ClientConfig::new("http://localhost:8080/api", credentials)?;
/// let client = WebhookClient::new(config)?;
///
/// for event in client.get_events().await? {
///     println!("{} {} {}", event.id, event.status, event.url);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    base_url: Url,
}

impl WebhookClient {
    /// Builds a client that sends the configured Basic credentials with
    /// every request.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, config.credentials.header_value()?);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {e}")))?;

        info!(
            base_url = %config.base_url,
            username = config.credentials.username(),
            timeout_ms = config.timeout.map(|t| t.as_millis() as u64),
            "Created webhook backend client"
        );

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Validation(format!("Base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String), Error> {
        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Webhook backend request could not be completed");
            Error::transport(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(status = status.as_u16(), error = %e, "Failed to read response body");
            Error::transport(e.to_string())
        })?;

        if status.is_success() {
            debug!(status = status.as_u16(), body_len = body.len(), "Backend request succeeded");
            Ok((status, body))
        } else {
            let message = backend_message(status, &body);
            warn!(
                status = status.as_u16(),
                message = message.as_str(),
                "Backend rejected request"
            );
            Err(Error::status(status.as_u16(), message))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        let (_, body) = self.execute(self.http.get(url)).await?;
        decode(&body)
    }

    async fn send_json<B, T>(
        &self,
        method: reqwest::Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let (_, text) = self.execute(self.http.request(method, url).json(body)).await?;
        decode(&text)
    }

    /// Fetches a list that the backend may answer with 204, an empty body or
    /// `null`.
    async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        let (status, body) = self.execute(self.http.get(url)).await?;
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let list: Option<Vec<T>> = decode(&body)?;
        Ok(list.unwrap_or_default())
    }

    async fn get_events_at(&self, url: Url) -> Result<Vec<WebhookEvent>, Error> {
        self.get_list::<EventResource>(url)
            .await?
            .into_iter()
            .map(EventResource::into_event)
            .collect()
    }

    async fn get_subscriptions_at(&self, url: Url) -> Result<Vec<WebhookSubscription>, Error> {
        self.get_list::<SubscriptionResource>(url)
            .await?
            .into_iter()
            .map(SubscriptionResource::into_subscription)
            .collect()
    }
}

#[async_trait]
impl WebhookApi for WebhookClient {
    #[instrument(skip(self, draft), fields(url = %draft.url, method = %draft.method))]
    async fn publish_event(&self, draft: &EventDraft) -> Result<WebhookEvent, Error> {
        let body = EventResource::from_draft(draft)?;
        let resource: EventResource = self
            .send_json(reqwest::Method::POST, &["events"], &body)
            .await?;
        let event = resource.into_event()?;

        info!(event_id = event.id.as_str(), "Published webhook event");
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn get_events(&self) -> Result<Vec<WebhookEvent>, Error> {
        let events = self.get_events_at(self.endpoint(&["events"])?).await?;
        debug!(count = events.len(), "Fetched events");
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn get_event(&self, id: &str) -> Result<WebhookEvent, Error> {
        let resource: EventResource = self
            .get_json(&["events", id])
            .await
            .map_err(|e| e.not_found_on_404("Event"))?;
        resource.into_event()
    }

    #[instrument(skip(self))]
    async fn get_failed_events(&self) -> Result<Vec<WebhookEvent>, Error> {
        self.get_events_at(self.endpoint(&["events", "failed"])?)
            .await
    }

    #[instrument(skip(self), fields(page = query.page, size = query.size))]
    async fn get_events_page(&self, query: &PageQuery) -> Result<Page<WebhookEvent>, Error> {
        let mut url = self.endpoint(&["events", "paginated"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &query.page.to_string())
                .append_pair("size", &query.size.to_string());
            if let Some(status) = query.status {
                pairs.append_pair("status", status.as_str());
            }
            if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
                pairs.append_pair("search", search.trim());
            }
        }

        let (_, body) = self.execute(self.http.get(url)).await?;
        let page: PageResource = decode(&body)?;
        page.into_page()
    }

    #[instrument(skip(self))]
    async fn retry_event(&self, id: &str) -> Result<WebhookEvent, Error> {
        let url = self.endpoint(&["events", id, "retry"])?;
        let outcome = self.execute(self.http.post(url)).await;

        let body = match outcome {
            Ok((_, body)) => body,
            Err(e) => return Err(self.classify_retry_failure(id, e).await),
        };

        let resource: EventResource = decode(&body)?;
        let event = resource.into_event()?;
        info!(
            event_id = event.id.as_str(),
            attempts = event.attempts,
            status = %event.status,
            "Retried webhook event"
        );
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn delete_event(&self, id: &str) -> Result<(), Error> {
        let url = self.endpoint(&["events", id])?;
        self.execute(self.http.delete(url))
            .await
            .map_err(|e| e.not_found_on_404("Event"))?;
        info!(event_id = id, "Deleted webhook event");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_subscriptions(&self) -> Result<Vec<WebhookSubscription>, Error> {
        let subscriptions = self
            .get_subscriptions_at(self.endpoint(&["subscriptions"])?)
            .await?;
        debug!(count = subscriptions.len(), "Fetched subscriptions");
        Ok(subscriptions)
    }

    #[instrument(skip(self))]
    async fn get_subscription(&self, id: &str) -> Result<WebhookSubscription, Error> {
        let resource: SubscriptionResource = self
            .get_json(&["subscriptions", id])
            .await
            .map_err(|e| e.not_found_on_404("Subscription"))?;
        resource.into_subscription()
    }

    #[instrument(skip(self))]
    async fn get_active_subscriptions(&self) -> Result<Vec<WebhookSubscription>, Error> {
        self.get_subscriptions_at(self.endpoint(&["subscriptions", "active"])?)
            .await
    }

    #[instrument(skip(self))]
    async fn search_subscriptions(&self, query: &str) -> Result<Vec<WebhookSubscription>, Error> {
        let mut url = self.endpoint(&["subscriptions", "search"])?;
        url.query_pairs_mut().append_pair("query", query);
        self.get_subscriptions_at(url).await
    }

    #[instrument(skip(self))]
    async fn get_subscriptions_by_event(
        &self,
        event_name: &str,
    ) -> Result<Vec<WebhookSubscription>, Error> {
        self.get_subscriptions_at(self.endpoint(&["subscriptions", "by-event", event_name])?)
            .await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name, url = %draft.url))]
    async fn create_subscription(
        &self,
        draft: &SubscriptionDraft,
    ) -> Result<WebhookSubscription, Error> {
        draft.validate()?;

        let body = SubscriptionResource::from_draft(draft);
        let resource: SubscriptionResource = self
            .send_json(reqwest::Method::POST, &["subscriptions"], &body)
            .await?;
        let subscription = resource.into_subscription()?;

        info!(
            subscription_id = subscription.id.as_str(),
            events = subscription.events.len(),
            "Created subscription"
        );
        Ok(subscription)
    }

    #[instrument(skip(self, update))]
    async fn update_subscription(
        &self,
        id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<WebhookSubscription, Error> {
        let body = SubscriptionResource::from_update(update);
        let resource: SubscriptionResource = self
            .send_json(reqwest::Method::PUT, &["subscriptions", id], &body)
            .await
            .map_err(|e| e.not_found_on_404("Subscription"))?;
        let subscription = resource.into_subscription()?;

        info!(subscription_id = id, "Updated subscription");
        Ok(subscription)
    }

    #[instrument(skip(self))]
    async fn delete_subscription(&self, id: &str) -> Result<(), Error> {
        let url = self.endpoint(&["subscriptions", id])?;
        self.execute(self.http.delete(url))
            .await
            .map_err(|e| e.not_found_on_404("Subscription"))?;
        info!(subscription_id = id, "Deleted subscription");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> Result<WebhookStats, Error> {
        let url = self.endpoint(&["events", "stats"])?;
        let (_, body) = self.execute(self.http.get(url)).await?;
        if body.trim().is_empty() {
            debug!("Stats response was empty, using zeroed snapshot");
            return Ok(WebhookStats::default());
        }

        let resource: Option<StatsResource> = decode(&body)?;
        Ok(resource.unwrap_or_default().into_stats())
    }

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register_admin(&self, registration: &AdminRegistration) -> Result<Admin, Error> {
        let body = RegisterRequest {
            email: registration.email.clone(),
            name: registration.name.clone(),
            password: registration.password.expose_secret().to_string(),
        };
        let resource: AdminResource = self
            .send_json(reqwest::Method::POST, &["admin", "register"], &body)
            .await?;
        let admin = resource.into_admin()?;

        info!(admin_id = admin.id.as_str(), "Registered administrator");
        Ok(admin)
    }

    #[instrument(skip(self, password))]
    async fn login_admin(&self, email: &str, password: &str) -> Result<Admin, Error> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resource: AdminResource = self
            .send_json(reqwest::Method::POST, &["admin", "login"], &body)
            .await
            .map_err(|e| match e.http_status() {
                Some(401) | Some(403) => Error::InvalidCredentials,
                _ => e,
            })?;
        let admin = resource.into_admin()?;

        info!(admin_id = admin.id.as_str(), "Administrator logged in");
        Ok(admin)
    }
}

impl WebhookClient {
    /// Works out whether a failed retry means the event does not exist.
    ///
    /// The backend answers a retry for a missing event with 404 or with a
    /// bare 400, the same status it uses when the attempt budget is spent.
    /// A 400 is settled by looking the event up.
    async fn classify_retry_failure(&self, id: &str, error: Error) -> Error {
        match error.http_status() {
            Some(404) => return Error::NotFound("Event not found".to_string()),
            Some(400) => {}
            _ => return error,
        }
        if let Error::Request { message, .. } = &error {
            if message.to_ascii_lowercase().contains("not found") {
                return Error::NotFound("Event not found".to_string());
            }
        }
        match self.get_event(id).await {
            Err(Error::NotFound(message)) => Error::NotFound(message),
            _ => error,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        error!(error = %e, body_len = body.len(), "Failed to decode backend response");
        Error::transport(format!("Invalid response body: {e}"))
    })
}

/// Picks the most useful message from an error response.
///
/// Prefers a JSON `message` or `error` field, then the raw body, then the
/// canonical reason phrase.
fn backend_message(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = fields.get(key) {
                if !message.trim().is_empty() {
                    return message.clone();
                }
            }
        }
    }
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}
