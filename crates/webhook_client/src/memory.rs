//! In-process implementation of [`WebhookApi`].
//!
//! Used by the dashboard's standalone mode and as the store behind test
//! backends. It follows the same contract as the HTTP client: ids and
//! timestamps are assigned here, retries bump the attempt counter, and the
//! same error variants are produced for the same conditions.

use std::cmp;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::models::{
    normalize_event_names, Admin, AdminRegistration, AdminRole, EventDraft, EventStatus,
    HttpMethod, Page, PageQuery, SubscriptionDraft, SubscriptionUpdate, WebhookEvent,
    WebhookStats, WebhookSubscription,
};
use crate::{Error, WebhookApi};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Login of the administrator seeded by [`MemoryWebhookApi::with_demo_data`].
pub const DEMO_ADMIN_EMAIL: &str = "admin@webhook.com";

/// Password of the seeded administrator.
pub const DEMO_ADMIN_PASSWORD: &str = "password";

struct StoredAdmin {
    admin: Admin,
    password: SecretString,
}

#[derive(Default)]
struct Store {
    next_id: u64,
    /// Oldest first
    events: Vec<WebhookEvent>,
    subscriptions: Vec<WebhookSubscription>,
    admins: Vec<StoredAdmin>,
}

impl Store {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn events_newest_first(&self) -> Vec<WebhookEvent> {
        let mut events: Vec<WebhookEvent> = self.events.iter().rev().cloned().collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events
    }
}

/// A [`WebhookApi`] that keeps all data in memory.
///
/// Cloning is not supported; share it behind an `Arc`.
#[derive(Default)]
pub struct MemoryWebhookApi {
    store: RwLock<Store>,
}

impl std::fmt::Debug for MemoryWebhookApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryWebhookApi").finish_non_exhaustive()
    }
}

impl MemoryWebhookApi {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding two events, two subscriptions and the
    /// `admin@webhook.com` administrator.
    pub fn with_demo_data() -> Self {
        let at = |y, mo, d, h, mi, s| {
            Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
                .single()
                .unwrap_or_default()
        };

        let events = vec![
            WebhookEvent {
                id: "2".to_string(),
                url: "https://api.partner.com/notifications".to_string(),
                method: HttpMethod::Post,
                headers: [("Content-Type".to_string(), "application/json".to_string())]
                    .into_iter()
                    .collect(),
                payload: json!({"orderId": "456", "status": "completed"}),
                status: EventStatus::Failed,
                attempts: 3,
                max_attempts: 3,
                created_at: at(2025, 1, 27, 9, 15, 0),
                updated_at: at(2025, 1, 27, 9, 45, 0),
                response_time: None,
                error_message: Some("Connection timeout".to_string()),
            },
            WebhookEvent {
                id: "1".to_string(),
                url: "https://api.example.com/webhooks/user-created".to_string(),
                method: HttpMethod::Post,
                headers: [
                    ("Content-Type".to_string(), "application/json".to_string()),
                    ("X-Webhook-Secret".to_string(), "secret123".to_string()),
                ]
                .into_iter()
                .collect(),
                payload: json!({"userId": "123", "action": "user.created"}),
                status: EventStatus::Success,
                attempts: 1,
                max_attempts: 3,
                created_at: at(2025, 1, 27, 10, 30, 0),
                updated_at: at(2025, 1, 27, 10, 30, 5),
                response_time: Some(150),
                error_message: None,
            },
        ];

        let subscriptions = vec![
            WebhookSubscription {
                id: "1".to_string(),
                name: "User Management Webhook".to_string(),
                url: "https://api.example.com/webhooks/user-events".to_string(),
                events: vec![
                    "user.created".to_string(),
                    "user.updated".to_string(),
                    "user.deleted".to_string(),
                ],
                secret: "webhook_secret_123".to_string(),
                is_active: true,
                created_at: at(2025, 1, 20, 8, 0, 0),
                updated_at: at(2025, 1, 27, 10, 0, 0),
            },
            WebhookSubscription {
                id: "2".to_string(),
                name: "Order Processing Webhook".to_string(),
                url: "https://api.partner.com/notifications".to_string(),
                events: vec![
                    "order.created".to_string(),
                    "order.completed".to_string(),
                    "order.cancelled".to_string(),
                ],
                secret: "webhook_secret_456".to_string(),
                is_active: false,
                created_at: at(2025, 1, 18, 14, 30, 0),
                updated_at: at(2025, 1, 26, 16, 20, 0),
            },
        ];

        let admins = vec![StoredAdmin {
            admin: Admin {
                id: "1".to_string(),
                email: DEMO_ADMIN_EMAIL.to_string(),
                name: "Admin User".to_string(),
                role: AdminRole::Admin,
                created_at: at(2025, 1, 1, 0, 0, 0),
                last_login: None,
            },
            password: SecretString::from(DEMO_ADMIN_PASSWORD.to_string()),
        }];

        Self {
            store: RwLock::new(Store {
                next_id: 2,
                events,
                subscriptions,
                admins,
            }),
        }
    }
}

/// Returns a modification time strictly later than `previous`.
fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    cmp::max(Utc::now(), previous + chrono::Duration::milliseconds(1))
}

fn event_not_found() -> Error {
    Error::NotFound("Event not found".to_string())
}

fn subscription_not_found() -> Error {
    Error::NotFound("Subscription not found".to_string())
}

#[async_trait]
impl WebhookApi for MemoryWebhookApi {
    #[instrument(skip(self, draft), fields(url = %draft.url))]
    async fn publish_event(&self, draft: &EventDraft) -> Result<WebhookEvent, Error> {
        if draft.url.trim().is_empty() {
            return Err(Error::status(400, "URL is required"));
        }
        if draft.effective_max_attempts() == 0 {
            return Err(Error::status(400, "Max attempts must be at least 1"));
        }

        let mut store = self.store.write().await;
        let now = Utc::now();
        let event = WebhookEvent {
            id: store.allocate_id(),
            url: draft.url.clone(),
            method: draft.method,
            headers: draft.headers.clone(),
            payload: draft.payload.clone(),
            status: EventStatus::Pending,
            attempts: 0,
            max_attempts: draft.effective_max_attempts(),
            created_at: now,
            updated_at: now,
            response_time: None,
            error_message: None,
        };
        store.events.push(event.clone());

        info!(event_id = event.id.as_str(), "Stored webhook event");
        Ok(event)
    }

    async fn get_events(&self) -> Result<Vec<WebhookEvent>, Error> {
        Ok(self.store.read().await.events_newest_first())
    }

    async fn get_event(&self, id: &str) -> Result<WebhookEvent, Error> {
        self.store
            .read()
            .await
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(event_not_found)
    }

    async fn get_failed_events(&self) -> Result<Vec<WebhookEvent>, Error> {
        let events = self.store.read().await.events_newest_first();
        Ok(events
            .into_iter()
            .filter(|e| e.status == EventStatus::Failed)
            .collect())
    }

    async fn get_events_page(&self, query: &PageQuery) -> Result<Page<WebhookEvent>, Error> {
        if query.size == 0 {
            return Err(Error::status(400, "Page size must not be less than one"));
        }

        let events = self.store.read().await.events_newest_first();
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let matching: Vec<WebhookEvent> = events
            .into_iter()
            .filter(|e| match (query.status, &search) {
                (Some(status), _) => e.status == status,
                (None, Some(text)) => e.url.to_lowercase().contains(text.as_str()),
                (None, None) => true,
            })
            .collect();

        let total_elements = matching.len() as u64;
        let total_pages = total_elements.div_ceil(u64::from(query.size)) as u32;
        let content = matching
            .into_iter()
            .skip(query.page as usize * query.size as usize)
            .take(query.size as usize)
            .collect();

        Ok(Page {
            content,
            total_elements,
            total_pages,
            number: query.page,
            size: query.size,
        })
    }

    #[instrument(skip(self))]
    async fn retry_event(&self, id: &str) -> Result<WebhookEvent, Error> {
        let mut store = self.store.write().await;
        let event = store
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(event_not_found)?;

        if event.attempts >= event.max_attempts {
            debug!(
                event_id = id,
                attempts = event.attempts,
                "Retry refused, attempt budget spent"
            );
            return Err(Error::status(400, "Maximum retry attempts reached"));
        }

        event.attempts += 1;
        event.status = EventStatus::Retrying;
        event.error_message = None;
        event.updated_at = touch(event.updated_at);

        info!(event_id = id, attempts = event.attempts, "Scheduled retry");
        Ok(event.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<(), Error> {
        let mut store = self.store.write().await;
        let before = store.events.len();
        store.events.retain(|e| e.id != id);
        if store.events.len() == before {
            return Err(event_not_found());
        }
        Ok(())
    }

    async fn get_subscriptions(&self) -> Result<Vec<WebhookSubscription>, Error> {
        Ok(self.store.read().await.subscriptions.clone())
    }

    async fn get_subscription(&self, id: &str) -> Result<WebhookSubscription, Error> {
        self.store
            .read()
            .await
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(subscription_not_found)
    }

    async fn get_active_subscriptions(&self) -> Result<Vec<WebhookSubscription>, Error> {
        let store = self.store.read().await;
        Ok(store
            .subscriptions
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }

    async fn search_subscriptions(&self, query: &str) -> Result<Vec<WebhookSubscription>, Error> {
        let needle = query.trim().to_lowercase();
        let store = self.store.read().await;
        Ok(store
            .subscriptions
            .iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle) || s.url.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn get_subscriptions_by_event(
        &self,
        event_name: &str,
    ) -> Result<Vec<WebhookSubscription>, Error> {
        let store = self.store.read().await;
        Ok(store
            .subscriptions
            .iter()
            .filter(|s| s.is_active && s.listens_to(event_name))
            .cloned()
            .collect())
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create_subscription(
        &self,
        draft: &SubscriptionDraft,
    ) -> Result<WebhookSubscription, Error> {
        draft.validate()?;

        let mut store = self.store.write().await;
        if store.subscriptions.iter().any(|s| s.url == draft.url) {
            return Err(Error::status(
                400,
                "Subscription with this URL already exists",
            ));
        }

        let now = Utc::now();
        let subscription = WebhookSubscription {
            id: store.allocate_id(),
            name: draft.name.clone(),
            url: draft.url.clone(),
            events: normalize_event_names(&draft.events),
            secret: draft.secret.clone(),
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        };
        store.subscriptions.push(subscription.clone());

        info!(
            subscription_id = subscription.id.as_str(),
            "Stored subscription"
        );
        Ok(subscription)
    }

    #[instrument(skip(self, update))]
    async fn update_subscription(
        &self,
        id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<WebhookSubscription, Error> {
        if let Some(events) = &update.events {
            if normalize_event_names(events).is_empty() {
                return Err(Error::status(400, "At least one event is required"));
            }
        }

        let mut store = self.store.write().await;
        let subscription = store
            .subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(subscription_not_found)?;

        update.apply_to(subscription);
        subscription.updated_at = touch(subscription.updated_at);
        Ok(subscription.clone())
    }

    async fn delete_subscription(&self, id: &str) -> Result<(), Error> {
        let mut store = self.store.write().await;
        let before = store.subscriptions.len();
        store.subscriptions.retain(|s| s.id != id);
        if store.subscriptions.len() == before {
            return Err(subscription_not_found());
        }
        info!(subscription_id = id, "Removed subscription");
        Ok(())
    }

    async fn get_stats(&self) -> Result<WebhookStats, Error> {
        Ok(WebhookStats::from_events(&self.store.read().await.events))
    }

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register_admin(&self, registration: &AdminRegistration) -> Result<Admin, Error> {
        if registration.email.trim().is_empty()
            || registration.name.trim().is_empty()
            || registration.password.expose_secret().is_empty()
        {
            return Err(Error::status(400, "Email, name and password are required"));
        }

        let mut store = self.store.write().await;
        if store
            .admins
            .iter()
            .any(|a| a.admin.email.eq_ignore_ascii_case(&registration.email))
        {
            return Err(Error::status(400, "Admin with this email already exists"));
        }

        let admin = Admin {
            id: store.allocate_id(),
            email: registration.email.clone(),
            name: registration.name.clone(),
            role: AdminRole::Admin,
            created_at: Utc::now(),
            last_login: None,
        };
        store.admins.push(StoredAdmin {
            admin: admin.clone(),
            password: SecretString::from(registration.password.expose_secret().to_string()),
        });
        Ok(admin)
    }

    #[instrument(skip(self, password))]
    async fn login_admin(&self, email: &str, password: &str) -> Result<Admin, Error> {
        let mut store = self.store.write().await;
        let stored = store
            .admins
            .iter_mut()
            .find(|a| a.admin.email.eq_ignore_ascii_case(email))
            .ok_or(Error::InvalidCredentials)?;

        if stored.password.expose_secret() != password {
            debug!("Password mismatch");
            return Err(Error::InvalidCredentials);
        }

        stored.admin.last_login = Some(Utc::now());
        Ok(stored.admin.clone())
    }
}
