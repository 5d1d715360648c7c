//! Backend stand-in shared by the view tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use webhook_client::models::{
    Admin, AdminRegistration, EventDraft, Page, PageQuery, SubscriptionDraft,
    SubscriptionUpdate, WebhookEvent, WebhookStats, WebhookSubscription,
};
use webhook_client::{Error, MemoryWebhookApi, WebhookApi};

/// Wraps the in-memory backend, counts calls and can be taken offline.
#[derive(Default)]
pub(crate) struct SwitchableApi {
    inner: MemoryWebhookApi,
    offline: AtomicBool,
    calls: AtomicUsize,
    latency_ms: AtomicU64,
    answered_reads: AtomicUsize,
}

impl SwitchableApi {
    pub(crate) fn with_demo_data() -> Self {
        Self {
            inner: MemoryWebhookApi::with_demo_data(),
            ..Default::default()
        }
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Delays the answer of `get_events` and `get_stats`.
    pub(crate) fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `get_events`/`get_stats` calls that ran to completion.
    pub(crate) fn answered_reads(&self) -> usize {
        self.answered_reads.load(Ordering::SeqCst)
    }

    async fn slow_read(&self) {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        self.answered_reads.fetch_add(1, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::transport("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl WebhookApi for SwitchableApi {
    async fn publish_event(&self, draft: &EventDraft) -> Result<WebhookEvent, Error> {
        self.check()?;
        self.inner.publish_event(draft).await
    }

    async fn get_events(&self) -> Result<Vec<WebhookEvent>, Error> {
        self.check()?;
        self.slow_read().await;
        self.inner.get_events().await
    }

    async fn get_event(&self, id: &str) -> Result<WebhookEvent, Error> {
        self.check()?;
        self.inner.get_event(id).await
    }

    async fn get_failed_events(&self) -> Result<Vec<WebhookEvent>, Error> {
        self.check()?;
        self.inner.get_failed_events().await
    }

    async fn get_events_page(&self, query: &PageQuery) -> Result<Page<WebhookEvent>, Error> {
        self.check()?;
        self.inner.get_events_page(query).await
    }

    async fn retry_event(&self, id: &str) -> Result<WebhookEvent, Error> {
        self.check()?;
        self.inner.retry_event(id).await
    }

    async fn delete_event(&self, id: &str) -> Result<(), Error> {
        self.check()?;
        self.inner.delete_event(id).await
    }

    async fn get_subscriptions(&self) -> Result<Vec<WebhookSubscription>, Error> {
        self.check()?;
        self.inner.get_subscriptions().await
    }

    async fn get_subscription(&self, id: &str) -> Result<WebhookSubscription, Error> {
        self.check()?;
        self.inner.get_subscription(id).await
    }

    async fn get_active_subscriptions(&self) -> Result<Vec<WebhookSubscription>, Error> {
        self.check()?;
        self.inner.get_active_subscriptions().await
    }

    async fn search_subscriptions(&self, query: &str) -> Result<Vec<WebhookSubscription>, Error> {
        self.check()?;
        self.inner.search_subscriptions(query).await
    }

    async fn get_subscriptions_by_event(
        &self,
        event_name: &str,
    ) -> Result<Vec<WebhookSubscription>, Error> {
        self.check()?;
        self.inner.get_subscriptions_by_event(event_name).await
    }

    async fn create_subscription(
        &self,
        draft: &SubscriptionDraft,
    ) -> Result<WebhookSubscription, Error> {
        self.check()?;
        self.inner.create_subscription(draft).await
    }

    async fn update_subscription(
        &self,
        id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<WebhookSubscription, Error> {
        self.check()?;
        self.inner.update_subscription(id, update).await
    }

    async fn delete_subscription(&self, id: &str) -> Result<(), Error> {
        self.check()?;
        self.inner.delete_subscription(id).await
    }

    async fn get_stats(&self) -> Result<WebhookStats, Error> {
        self.check()?;
        self.slow_read().await;
        self.inner.get_stats().await
    }

    async fn register_admin(&self, registration: &AdminRegistration) -> Result<Admin, Error> {
        self.check()?;
        self.inner.register_admin(registration).await
    }

    async fn login_admin(&self, email: &str, password: &str) -> Result<Admin, Error> {
        self.check()?;
        self.inner.login_admin(email, password).await
    }
}
