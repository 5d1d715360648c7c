use super::*;
use serde_json::json;

fn draft() -> EventDraft {
    EventDraft::new("https://hooks.example.com/orders", HttpMethod::Put)
        .with_header("Content-Type", "application/json")
        .with_payload(json!({"event": "order.paid", "data": {"total": 12.5}}))
}

fn subscription_draft(url: &str, events: &[&str]) -> SubscriptionDraft {
    SubscriptionDraft {
        name: "Orders".to_string(),
        url: url.to_string(),
        events: events.iter().map(|e| e.to_string()).collect(),
        secret: "webhook_abc".to_string(),
        is_active: true,
    }
}

#[tokio::test]
async fn test_publish_then_list_contains_event() {
    let api = MemoryWebhookApi::new();

    let published = api.publish_event(&draft()).await.unwrap();
    let events = api.get_events().await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0], published);
    assert_eq!(published.status, EventStatus::Pending);
    assert_eq!(published.attempts, 0);
    assert_eq!(published.max_attempts, 3);
}

#[tokio::test]
async fn test_events_listed_newest_first() {
    let api = MemoryWebhookApi::with_demo_data();

    let created = api.publish_event(&draft()).await.unwrap();
    let events = api.get_events().await.unwrap();

    assert_eq!(events[0].id, created.id);
    assert_eq!(events[1].id, "1");
    assert_eq!(events[2].id, "2");
}

#[tokio::test]
async fn test_publish_rejects_blank_url() {
    let api = MemoryWebhookApi::new();
    let error = api
        .publish_event(&EventDraft::new("  ", HttpMethod::Post))
        .await
        .unwrap_err();

    assert_eq!(error.http_status(), Some(400));
}

#[tokio::test]
async fn test_retry_increments_attempts() {
    let api = MemoryWebhookApi::new();
    let event = api.publish_event(&draft()).await.unwrap();

    let retried = api.retry_event(&event.id).await.unwrap();

    assert_eq!(retried.id, event.id);
    assert_eq!(retried.attempts, event.attempts + 1);
    assert_eq!(retried.status, EventStatus::Retrying);
    assert!(retried.updated_at > event.updated_at);
}

#[tokio::test]
async fn test_retry_unknown_event_is_not_found() {
    let api = MemoryWebhookApi::new();
    let error = api.retry_event("999").await.unwrap_err();

    assert_eq!(error, Error::NotFound("Event not found".to_string()));
}

#[tokio::test]
async fn test_retry_refused_when_budget_spent() {
    let api = MemoryWebhookApi::with_demo_data();

    // Demo event 2 already used 3 of 3 attempts
    let error = api.retry_event("2").await.unwrap_err();

    assert_eq!(error.http_status(), Some(400));
}

#[tokio::test]
async fn test_failed_events_and_pagination() {
    let api = MemoryWebhookApi::with_demo_data();
    for _ in 0..3 {
        api.publish_event(&draft()).await.unwrap();
    }

    let failed = api.get_failed_events().await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, "2");

    let page = api
        .get_events_page(&PageQuery {
            page: 1,
            size: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total_elements, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.content.len(), 2);

    let by_status = api
        .get_events_page(&PageQuery {
            status: Some(EventStatus::Success),
            search: Some("partner".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_status.total_elements, 1);
    assert_eq!(by_status.content[0].id, "1");

    let by_search = api
        .get_events_page(&PageQuery {
            search: Some("PARTNER".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_search.total_elements, 1);
    assert_eq!(by_search.content[0].id, "2");
}

#[tokio::test]
async fn test_delete_event() {
    let api = MemoryWebhookApi::with_demo_data();

    api.delete_event("1").await.unwrap();

    assert!(matches!(api.get_event("1").await, Err(Error::NotFound(_))));
    assert!(matches!(api.delete_event("1").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_create_subscription_rejects_empty_events() {
    let api = MemoryWebhookApi::new();

    let error = api
        .create_subscription(&subscription_draft("https://a.example.com", &[" ", ""]))
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Validation(_)));
    assert!(api.get_subscriptions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_subscription_normalizes_and_rejects_duplicate_url() {
    let api = MemoryWebhookApi::new();
    let created = api
        .create_subscription(&subscription_draft(
            "https://a.example.com",
            &["order.paid", " order.paid", "order.refunded"],
        ))
        .await
        .unwrap();

    assert_eq!(created.events, vec!["order.paid", "order.refunded"]);

    let error = api
        .create_subscription(&subscription_draft("https://a.example.com", &["x"]))
        .await
        .unwrap_err();
    assert_eq!(error.http_status(), Some(400));
}

#[tokio::test]
async fn test_update_subscription_changes_only_given_fields() {
    let api = MemoryWebhookApi::with_demo_data();
    let before = api.get_subscription("1").await.unwrap();

    let after = api
        .update_subscription("1", &SubscriptionUpdate::default().name("Renamed"))
        .await
        .unwrap();

    assert_eq!(after.name, "Renamed");
    assert_eq!(after.url, before.url);
    assert_eq!(after.events, before.events);
    assert_eq!(after.secret, before.secret);
    assert_eq!(after.is_active, before.is_active);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_update_unknown_subscription_is_not_found() {
    let api = MemoryWebhookApi::new();
    let result = api
        .update_subscription("42", &SubscriptionUpdate::default().active(false))
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_delete_subscription_removes_it() {
    let api = MemoryWebhookApi::with_demo_data();

    api.delete_subscription("2").await.unwrap();
    let remaining = api.get_subscriptions().await.unwrap();

    assert!(remaining.iter().all(|s| s.id != "2"));
    assert!(matches!(
        api.delete_subscription("2").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_subscription_queries() {
    let api = MemoryWebhookApi::with_demo_data();

    let active = api.get_active_subscriptions().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "1");

    let found = api.search_subscriptions("order processing").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "2");

    let by_url = api.search_subscriptions("EXAMPLE.COM").await.unwrap();
    assert_eq!(by_url.len(), 1);

    // Subscription 2 listens to order.created but is inactive
    assert!(api
        .get_subscriptions_by_event("order.created")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        api.get_subscriptions_by_event("user.updated")
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_stats_sum_matches_total() {
    let api = MemoryWebhookApi::with_demo_data();
    api.publish_event(&draft()).await.unwrap();

    let stats = api.get_stats().await.unwrap();

    assert_eq!(stats.total_events, 3);
    assert_eq!(stats.events_by_status.total(), stats.total_events);
    assert_eq!(stats.successful_events, 1);
    assert_eq!(stats.failed_events, 1);
    assert_eq!(stats.average_response_time, 150);
    assert_eq!(stats.recent_events.len(), 3);
}

#[tokio::test]
async fn test_login_with_demo_admin_sets_last_login() {
    let api = MemoryWebhookApi::with_demo_data();
    let before = Utc::now();

    let admin = api
        .login_admin(DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD)
        .await
        .unwrap();

    assert_eq!(admin.role, AdminRole::Admin);
    assert!(admin.last_login.unwrap() >= before);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_invalid_credentials() {
    let api = MemoryWebhookApi::with_demo_data();

    let error = api
        .login_admin(DEMO_ADMIN_EMAIL, "wrong")
        .await
        .unwrap_err();

    assert_eq!(error, Error::InvalidCredentials);
    assert!(!error.is_transport());
}

#[tokio::test]
async fn test_register_then_login() {
    let api = MemoryWebhookApi::new();
    let registration = AdminRegistration {
        email: "ops@example.com".to_string(),
        name: "Ops".to_string(),
        password: SecretString::from("correct horse".to_string()),
    };

    let admin = api.register_admin(&registration).await.unwrap();
    assert_eq!(admin.role, AdminRole::Admin);
    assert_eq!(admin.last_login, None);

    let duplicate = api.register_admin(&registration).await.unwrap_err();
    assert_eq!(duplicate.http_status(), Some(400));

    let logged_in = api
        .login_admin("ops@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(logged_in.id, admin.id);
    assert!(logged_in.last_login.is_some());
}
