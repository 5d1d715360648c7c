//! # Models
//!
//! Domain models exchanged with the webhook-management backend.
//!
//! These types are the client-side view of backend resources. They are value
//! objects: the backend is the authoritative store and every fetch returns a
//! fresh copy. The JSON double-encoding used on the wire lives in
//! [`crate::wire`]; the types here always carry structured values.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Number of delivery attempts the backend makes when a draft does not say otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Maximum number of events carried in [`WebhookStats::recent_events`].
pub const RECENT_EVENTS_LIMIT: usize = 10;

/// HTTP method used to deliver a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    /// Every supported method, in display order.
    pub const ALL: [HttpMethod; 3] = [HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch];

    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    /// Parses a method name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            _ => Err(Error::Validation(format!("Unsupported HTTP method '{s}'"))),
        }
    }
}

/// Delivery status of a webhook event.
///
/// Status transitions are decided by the backend. The client only reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Success,
    Failed,
    Retrying,
}

impl EventStatus {
    /// Every status, in the order the dashboard lists them.
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Pending,
        EventStatus::Success,
        EventStatus::Failed,
        EventStatus::Retrying,
    ];

    /// Returns the lower-case name used by the dashboard.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
        }
    }

    /// Returns the upper-case enum name the backend stores.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Retrying => "RETRYING",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = Error;

    /// Parses a status name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "retrying" => Ok(Self::Retrying),
            _ => Err(Error::Validation(format!("Unknown event status '{s}'"))),
        }
    }
}

/// One attempted outbound HTTP call tracked by the backend.
///
/// `headers` and `payload` are structured here; on the wire they travel as
/// JSON-encoded strings (see [`crate::wire::EventResource`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Backend-assigned identifier
    pub id: String,
    /// Target URL of the delivery
    pub url: String,
    /// HTTP method used for delivery
    pub method: HttpMethod,
    /// Request headers sent with the delivery
    pub headers: BTreeMap<String, String>,
    /// Arbitrary JSON body
    pub payload: Value,
    /// Current delivery status
    pub status: EventStatus,
    /// Attempts made so far
    pub attempts: u32,
    /// Attempt budget
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Duration of the last delivery in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    /// Error reported by the last failed delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Event fields supplied when publishing.
///
/// The backend assigns the id, timestamps, status and attempt counter.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use webhook_client::models::{EventDraft, HttpMethod, DEFAULT_MAX_ATTEMPTS};
///
/// let draft = EventDraft::new("https://api.example.com/hook", HttpMethod::Post)
///     .with_header("Content-Type", "application/json")
///     .with_payload(json!({"event": "user.created"}));
///
/// assert_eq!(draft.effective_max_attempts(), DEFAULT_MAX_ATTEMPTS);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub payload: Value,
    /// Attempt budget, [`DEFAULT_MAX_ATTEMPTS`] when absent
    pub max_attempts: Option<u32>,
}

impl EventDraft {
    /// Creates a draft with no headers and a null payload.
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            payload: Value::Null,
            max_attempts: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Returns the attempt budget that will be sent to the backend.
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }
}

/// A registration describing which events are delivered to a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscription {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Event names, deduplicated, in first-seen order
    pub events: Vec<String>,
    /// Shared signing secret
    pub secret: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookSubscription {
    /// Returns true when the subscription listens to `event_name`.
    pub fn listens_to(&self, event_name: &str) -> bool {
        self.events.iter().any(|e| e == event_name)
    }
}

/// Fields supplied when creating a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDraft {
    pub name: String,
    pub url: String,
    pub events: Vec<String>,
    pub secret: String,
    pub is_active: bool,
}

impl SubscriptionDraft {
    /// Returns the draft with its event list in canonical form.
    pub fn normalized(mut self) -> Self {
        self.events = normalize_event_names(&self.events);
        self
    }

    /// Checks the preconditions that must hold before the draft is sent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when no non-blank event name remains.
    pub fn validate(&self) -> Result<(), Error> {
        if normalize_event_names(&self.events).is_empty() {
            return Err(Error::Validation(
                "At least one event is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update of a subscription.
///
/// Only the fields that are `Some` are sent; the backend leaves the others
/// untouched.
///
/// # Examples
///
/// ```rust
/// use webhook_client::models::SubscriptionUpdate;
///
/// let patch = SubscriptionUpdate::default().name("Renamed").active(false);
/// assert!(!patch.is_empty());
/// assert!(patch.url.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub secret: Option<String>,
    pub is_active: Option<bool>,
}

impl SubscriptionUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Returns true when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.events.is_none()
            && self.secret.is_none()
            && self.is_active.is_none()
    }

    /// Applies the patch to `subscription` in place.
    ///
    /// `updated_at` is not touched; the caller owns the clock.
    pub fn apply_to(&self, subscription: &mut WebhookSubscription) {
        if let Some(name) = &self.name {
            subscription.name = name.clone();
        }
        if let Some(url) = &self.url {
            subscription.url = url.clone();
        }
        if let Some(events) = &self.events {
            subscription.events = normalize_event_names(events);
        }
        if let Some(secret) = &self.secret {
            subscription.secret = secret.clone();
        }
        if let Some(is_active) = self.is_active {
            subscription.is_active = is_active;
        }
    }
}

/// Brings a list of event names into canonical form.
///
/// Names are trimmed, blank names dropped and duplicates removed keeping the
/// first occurrence.
///
/// # Examples
///
/// ```rust
/// use webhook_client::models::normalize_event_names;
///
/// let events = normalize_event_names(&[" user.created", "", "order.paid", "user.created"]);
/// assert_eq!(events, vec!["user.created", "order.paid"]);
/// ```
pub fn normalize_event_names<S: AsRef<str>>(events: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    events
        .iter()
        .map(|e| e.as_ref().trim())
        .filter(|e| !e.is_empty())
        .filter(|e| seen.insert(e.to_string()))
        .map(str::to_string)
        .collect()
}

/// Event counts per delivery status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub success: u64,
    pub failed: u64,
    pub retrying: u64,
}

impl StatusCounts {
    /// Returns the count for a single status.
    pub fn get(&self, status: EventStatus) -> u64 {
        match status {
            EventStatus::Pending => self.pending,
            EventStatus::Success => self.success,
            EventStatus::Failed => self.failed,
            EventStatus::Retrying => self.retrying,
        }
    }

    pub fn set(&mut self, status: EventStatus, count: u64) {
        match status {
            EventStatus::Pending => self.pending = count,
            EventStatus::Success => self.success = count,
            EventStatus::Failed => self.failed = count,
            EventStatus::Retrying => self.retrying = count,
        }
    }

    pub fn increment(&mut self, status: EventStatus) {
        self.set(status, self.get(status) + 1);
    }

    /// Sum over every status.
    pub fn total(&self) -> u64 {
        self.pending + self.success + self.failed + self.retrying
    }
}

/// Aggregate delivery statistics.
///
/// A read-only snapshot recomputed by the backend on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookStats {
    pub total_events: u64,
    pub successful_events: u64,
    pub failed_events: u64,
    /// Mean response time in milliseconds, rounded
    pub average_response_time: u64,
    pub events_by_status: StatusCounts,
    /// Newest first, at most [`RECENT_EVENTS_LIMIT`] entries
    pub recent_events: Vec<WebhookEvent>,
}

impl WebhookStats {
    /// Computes a snapshot from a full list of events.
    ///
    /// The average only covers events that report a response time.
    pub fn from_events(events: &[WebhookEvent]) -> Self {
        let mut by_status = StatusCounts::default();
        for event in events {
            by_status.increment(event.status);
        }

        let timed: Vec<u64> = events.iter().filter_map(|e| e.response_time).collect();
        let average_response_time = if timed.is_empty() {
            0
        } else {
            (timed.iter().sum::<u64>() as f64 / timed.len() as f64).round() as u64
        };

        let mut recent: Vec<WebhookEvent> = events.to_vec();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RECENT_EVENTS_LIMIT);

        Self {
            total_events: events.len() as u64,
            successful_events: by_status.success,
            failed_events: by_status.failed,
            average_response_time,
            events_by_status: by_status,
            recent_events: recent,
        }
    }
}

/// Role assigned to an administrator by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    Viewer,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(Error::Validation(format!("Unknown admin role '{s}'"))),
        }
    }
}

/// A dashboard administrator. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    /// Set by the backend on every successful login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields supplied when registering an administrator.
#[derive(Debug)]
pub struct AdminRegistration {
    pub email: String,
    pub name: String,
    pub password: SecretString,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    /// Zero-based page index
    pub number: u32,
    pub size: u32,
}

/// Query for [`crate::WebhookApi::get_events_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    pub status: Option<EventStatus>,
    pub search: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            status: None,
            search: None,
        }
    }
}
