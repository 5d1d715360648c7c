//! Wire representation of backend resources.
//!
//! The backend stores event `headers` and `payload` as JSON text and sends
//! them back as JSON-encoded strings inside the JSON resource. It also uses
//! numeric ids, upper-case enum names and zone-less timestamps. The resource
//! types in this module mirror that shape exactly and convert to and from the
//! structured [`crate::models`] types.
//!
//! Conversions in both directions are public so that a stand-in backend can
//! speak the same format.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    normalize_event_names, Admin, AdminRole, EventDraft, EventStatus, HttpMethod, Page,
    StatusCounts, SubscriptionDraft, SubscriptionUpdate, WebhookEvent, WebhookStats,
    WebhookSubscription, DEFAULT_MAX_ATTEMPTS, RECENT_EVENTS_LIMIT,
};
use crate::Error;

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;

/// Timestamp layout used by the backend (no zone, UTC implied).
const BACKEND_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A resource identifier that may arrive as a JSON number or string.
///
/// Serializes back as a number when the id is purely numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0.parse::<u64>() {
            Ok(numeric) => serializer.serialize_u64(numeric),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = ResourceId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer identifier")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ResourceId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ResourceId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ResourceId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Parses a backend timestamp.
///
/// Accepts RFC 3339 and the backend's zone-less ISO-8601 form, which is read
/// as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, BACKEND_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::transport(format!("Invalid timestamp '{value}': {e}")))
}

/// Formats a timestamp the way the backend emits it.
pub fn format_backend_timestamp(value: &DateTime<Utc>) -> String {
    value.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Encodes event headers into the JSON string the backend stores.
pub fn encode_headers(headers: &BTreeMap<String, String>) -> Result<String, Error> {
    serde_json::to_string(headers)
        .map_err(|e| Error::Validation(format!("Headers cannot be encoded: {e}")))
}

/// Decodes the backend's header string.
///
/// A missing, empty or `null` string decodes to an empty mapping.
pub fn decode_headers(encoded: Option<&str>) -> Result<BTreeMap<String, String>, Error> {
    match encoded.map(str::trim) {
        None | Some("") | Some("null") => Ok(BTreeMap::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| Error::transport(format!("Invalid headers encoding: {e}"))),
    }
}

/// Encodes an event payload into the JSON string the backend stores.
pub fn encode_payload(payload: &Value) -> Result<String, Error> {
    serde_json::to_string(payload)
        .map_err(|e| Error::Validation(format!("Payload cannot be encoded: {e}")))
}

/// Decodes the backend's payload string.
///
/// A missing or empty string decodes to `null`. Text that is not JSON is kept
/// as a JSON string so the body is never lost.
pub fn decode_payload(encoded: Option<&str>) -> Value {
    match encoded {
        None => Value::Null,
        Some(text) if text.trim().is_empty() => Value::Null,
        Some(text) => serde_json::from_str(text).unwrap_or_else(|e| {
            debug!(error = %e, "Payload is not JSON, keeping raw text");
            Value::String(text.to_string())
        }),
    }
}

fn required<T>(value: Option<T>, resource: &str, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| Error::transport(format!("{resource} response is missing '{field}'")))
}

/// Event resource as exchanged with the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// JSON-encoded header mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    /// JSON-encoded payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl EventResource {
    /// Builds the create request body for a draft.
    pub fn from_draft(draft: &EventDraft) -> Result<Self, Error> {
        Ok(Self {
            url: Some(draft.url.clone()),
            method: Some(draft.method.as_str().to_string()),
            headers: Some(encode_headers(&draft.headers)?),
            payload: Some(encode_payload(&draft.payload)?),
            max_attempts: Some(draft.effective_max_attempts()),
            ..Default::default()
        })
    }

    /// Builds the resource the backend would send for `event`.
    pub fn from_event(event: &WebhookEvent) -> Result<Self, Error> {
        Ok(Self {
            id: Some(ResourceId(event.id.clone())),
            url: Some(event.url.clone()),
            method: Some(event.method.as_str().to_string()),
            headers: Some(encode_headers(&event.headers)?),
            payload: Some(encode_payload(&event.payload)?),
            status: Some(event.status.backend_name().to_string()),
            attempts: Some(event.attempts),
            max_attempts: Some(event.max_attempts),
            response_time: event.response_time,
            error_message: event.error_message.clone(),
            created_at: Some(format_backend_timestamp(&event.created_at)),
            updated_at: Some(format_backend_timestamp(&event.updated_at)),
        })
    }

    /// Decodes the resource into a structured event.
    ///
    /// `status` and `method` are case-normalized; missing counters fall back
    /// to the backend defaults.
    pub fn into_event(self) -> Result<WebhookEvent, Error> {
        let id = required(self.id, "Event", "id")?;
        let created_at = parse_timestamp(&required(self.created_at, "Event", "createdAt")?)?;
        let updated_at = match self.updated_at {
            Some(raw) => parse_timestamp(&raw)?,
            None => created_at,
        };
        let method = match self.method {
            Some(raw) => raw.parse::<HttpMethod>().map_err(|_| {
                Error::transport(format!("Event {id} has unknown method '{raw}'"))
            })?,
            None => HttpMethod::Post,
        };
        let status = match self.status {
            Some(raw) => raw.parse::<EventStatus>().map_err(|_| {
                Error::transport(format!("Event {id} has unknown status '{raw}'"))
            })?,
            None => EventStatus::Pending,
        };

        Ok(WebhookEvent {
            headers: decode_headers(self.headers.as_deref())?,
            payload: decode_payload(self.payload.as_deref()),
            id: id.0,
            url: self.url.unwrap_or_default(),
            method,
            status,
            attempts: self.attempts.unwrap_or(0),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            created_at,
            updated_at,
            response_time: self.response_time,
            error_message: self.error_message,
        })
    }

    /// Rebuilds a draft from a create request body.
    pub fn into_draft(self) -> Result<EventDraft, Error> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Validation("URL is required".to_string()))?;
        let method = required(self.method, "Event", "method")?.parse::<HttpMethod>()?;
        Ok(EventDraft {
            url,
            method,
            headers: decode_headers(self.headers.as_deref())?,
            payload: decode_payload(self.payload.as_deref()),
            max_attempts: self.max_attempts,
        })
    }
}

/// Subscription resource as exchanged with the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl SubscriptionResource {
    pub fn from_draft(draft: &SubscriptionDraft) -> Self {
        Self {
            name: Some(draft.name.clone()),
            url: Some(draft.url.clone()),
            events: Some(normalize_event_names(&draft.events)),
            secret: Some(draft.secret.clone()),
            is_active: Some(draft.is_active),
            ..Default::default()
        }
    }

    /// Builds a patch body holding only the fields present in `update`.
    pub fn from_update(update: &SubscriptionUpdate) -> Self {
        Self {
            name: update.name.clone(),
            url: update.url.clone(),
            events: update.events.as_deref().map(normalize_event_names),
            secret: update.secret.clone(),
            is_active: update.is_active,
            ..Default::default()
        }
    }

    pub fn from_subscription(subscription: &WebhookSubscription) -> Self {
        Self {
            id: Some(ResourceId(subscription.id.clone())),
            name: Some(subscription.name.clone()),
            url: Some(subscription.url.clone()),
            events: Some(subscription.events.clone()),
            secret: Some(subscription.secret.clone()),
            is_active: Some(subscription.is_active),
            created_at: Some(format_backend_timestamp(&subscription.created_at)),
            updated_at: Some(format_backend_timestamp(&subscription.updated_at)),
        }
    }

    /// Decodes the resource, normalizing `events` to a deduplicated list.
    pub fn into_subscription(self) -> Result<WebhookSubscription, Error> {
        let id = required(self.id, "Subscription", "id")?;
        let created_at = parse_timestamp(&required(self.created_at, "Subscription", "createdAt")?)?;
        let updated_at = match self.updated_at {
            Some(raw) => parse_timestamp(&raw)?,
            None => created_at,
        };

        Ok(WebhookSubscription {
            id: id.0,
            name: self.name.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            events: normalize_event_names(&self.events.unwrap_or_default()),
            secret: self.secret.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            created_at,
            updated_at,
        })
    }

    /// Rebuilds a draft from a create request body.
    pub fn into_draft(self) -> SubscriptionDraft {
        SubscriptionDraft {
            name: self.name.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            events: self.events.unwrap_or_default(),
            secret: self.secret.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
        }
    }

    /// Rebuilds a patch from an update request body.
    pub fn into_update(self) -> SubscriptionUpdate {
        SubscriptionUpdate {
            name: self.name,
            url: self.url,
            events: self.events,
            secret: self.secret,
            is_active: self.is_active,
        }
    }
}

/// Statistics resource as sent by the backend.
///
/// Every field is optional and every numeric accepts integers, floats or
/// numeric strings; gaps decode to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_events: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_events: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_events: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_response_time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_by_status: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_events: Option<Vec<Value>>,
}

/// Reads a count from a loosely typed JSON value, rounding floats.
fn lenient_count(value: Option<&Value>) -> u64 {
    let Some(value) = value else {
        return 0;
    };
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f.round() as u64)
            .unwrap_or(0),
        _ => 0,
    }
}

impl StatsResource {
    pub fn from_stats(stats: &WebhookStats) -> Result<Self, Error> {
        let events_by_status = EventStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), Value::from(stats.events_by_status.get(*s))))
            .collect();
        let recent_events = stats
            .recent_events
            .iter()
            .map(|e| {
                EventResource::from_event(e).and_then(|r| {
                    serde_json::to_value(r)
                        .map_err(|e| Error::Validation(format!("Event cannot be encoded: {e}")))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            total_events: Some(Value::from(stats.total_events)),
            successful_events: Some(Value::from(stats.successful_events)),
            failed_events: Some(Value::from(stats.failed_events)),
            average_response_time: Some(Value::from(stats.average_response_time as f64)),
            events_by_status: Some(events_by_status),
            recent_events: Some(recent_events),
        })
    }

    /// Decodes the snapshot. Never fails: gaps become zero or empty.
    pub fn into_stats(self) -> WebhookStats {
        let mut by_status = StatusCounts::default();
        for (key, value) in self.events_by_status.unwrap_or_default() {
            match key.parse::<EventStatus>() {
                Ok(status) => by_status.set(status, lenient_count(Some(&value))),
                Err(_) => debug!(key = %key, "Ignoring unknown status bucket in stats"),
            }
        }

        let mut recent_events = Vec::new();
        for raw in self.recent_events.unwrap_or_default() {
            let decoded = serde_json::from_value::<EventResource>(raw)
                .map_err(|e| Error::transport(e.to_string()))
                .and_then(EventResource::into_event);
            match decoded {
                Ok(event) => recent_events.push(event),
                Err(e) => warn!(error = %e, "Skipping undecodable recent event"),
            }
        }
        recent_events.truncate(RECENT_EVENTS_LIMIT);

        WebhookStats {
            total_events: lenient_count(self.total_events.as_ref()),
            successful_events: lenient_count(self.successful_events.as_ref()),
            failed_events: lenient_count(self.failed_events.as_ref()),
            average_response_time: lenient_count(self.average_response_time.as_ref()),
            events_by_status: by_status,
            recent_events,
        }
    }
}

/// Administrator resource as sent by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

impl AdminResource {
    pub fn from_admin(admin: &Admin) -> Self {
        Self {
            id: Some(ResourceId(admin.id.clone())),
            email: Some(admin.email.clone()),
            name: Some(admin.name.clone()),
            role: Some(admin.role.as_str().to_ascii_uppercase()),
            created_at: Some(format_backend_timestamp(&admin.created_at)),
            last_login: admin.last_login.as_ref().map(format_backend_timestamp),
        }
    }

    pub fn into_admin(self) -> Result<Admin, Error> {
        let id = required(self.id, "Admin", "id")?;
        let role = match self.role {
            Some(raw) => raw
                .parse::<AdminRole>()
                .map_err(|_| Error::transport(format!("Admin {id} has unknown role '{raw}'")))?,
            None => AdminRole::Admin,
        };
        let created_at = parse_timestamp(&required(self.created_at, "Admin", "createdAt")?)?;
        let last_login = self.last_login.as_deref().map(parse_timestamp).transpose()?;

        Ok(Admin {
            id: id.0,
            email: self.email.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            role,
            created_at,
            last_login,
        })
    }
}

/// Body of `POST /admin/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Body of `POST /admin/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// One page of events as sent by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResource {
    #[serde(default)]
    pub content: Vec<EventResource>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl PageResource {
    pub fn from_page(page: &Page<WebhookEvent>) -> Result<Self, Error> {
        Ok(Self {
            content: page
                .content
                .iter()
                .map(EventResource::from_event)
                .collect::<Result<_, _>>()?,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            number: page.number,
            size: page.size,
        })
    }

    pub fn into_page(self) -> Result<Page<WebhookEvent>, Error> {
        Ok(Page {
            content: self
                .content
                .into_iter()
                .map(EventResource::into_event)
                .collect::<Result<_, _>>()?,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
        })
    }
}
