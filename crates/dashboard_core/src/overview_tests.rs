use super::*;
use crate::test_support::SwitchableApi;
use std::time::Duration;
use tracing_test::traced_test;

#[tokio::test]
async fn test_overview_loads_stats() {
    let api = Arc::new(SwitchableApi::with_demo_data());
    let mut view = OverviewView::new(api);
    assert!(view.is_loading());

    view.load().await;

    assert!(!view.is_loading());
    assert!(!view.backend_unavailable());
    let cards = view.stat_cards();
    assert_eq!(cards[0], StatCard { title: "Total Events", value: "2".to_string() });
    assert_eq!(cards[3].value, "150ms");
}

#[tokio::test]
#[traced_test]
async fn test_overview_degrades_when_backend_is_down() {
    let api = Arc::new(SwitchableApi::with_demo_data());
    api.set_offline(true);
    let mut view = OverviewView::new(api);

    view.load().await;

    assert!(view.backend_unavailable());
    assert!(!view.is_loading());
    assert_eq!(view.stats(), WebhookStats::default());
    assert_eq!(view.stat_cards()[3].value, "0ms");
    assert!(view.recent_events().is_empty());
    assert!(view.last_error().is_some());
    assert!(logs_contain("Backend unavailable"));
}

#[tokio::test]
async fn test_overview_keeps_stats_when_refresh_fails() {
    let api = Arc::new(SwitchableApi::with_demo_data());
    let mut view = OverviewView::new(api.clone());
    view.load().await;

    api.set_offline(true);
    view.load().await;

    assert!(view.backend_unavailable());
    assert_eq!(view.stats().total_events, 2);

    api.set_offline(false);
    view.load().await;
    assert!(!view.backend_unavailable());
    assert_eq!(view.last_error(), None);
}

#[tokio::test]
async fn test_status_breakdown_percentages() {
    let api = Arc::new(SwitchableApi::with_demo_data());
    let mut view = OverviewView::new(api);
    view.load().await;

    let breakdown = view.status_breakdown();

    let success = breakdown
        .iter()
        .find(|s| s.status == EventStatus::Success)
        .unwrap();
    assert_eq!(success.count, 1);
    assert_eq!(success.percent, 50);
    assert_eq!(breakdown.iter().map(|s| s.count).sum::<u64>(), 2);
}

#[test]
fn test_status_breakdown_of_empty_stats_is_zero() {
    let breakdown = status_breakdown(&WebhookStats::default());
    assert_eq!(breakdown.len(), 4);
    assert!(breakdown.iter().all(|s| s.percent == 0));
}

#[tokio::test]
async fn test_recent_events_limited_to_five() {
    let api = Arc::new(SwitchableApi::with_demo_data());
    for i in 0..6 {
        api.publish_event(&webhook_client::models::EventDraft::new(
            format!("https://example.com/{i}"),
            webhook_client::models::HttpMethod::Post,
        ))
        .await
        .unwrap();
    }
    let mut view = OverviewView::new(api);
    view.load().await;

    assert_eq!(view.recent_events().len(), OVERVIEW_RECENT_EVENTS);
}

#[tokio::test]
async fn test_background_load_feeds_view() {
    let api = Arc::new(SwitchableApi::with_demo_data());
    let mut view = OverviewView::new(api);

    let task = view.start_load();
    assert!(view.is_loading());
    let result = task.join().await.unwrap();
    view.finish_load(result);

    assert!(!view.backend_unavailable());
    assert_eq!(view.stats().total_events, 2);
}

#[tokio::test]
async fn test_dropping_background_load_leaves_view_untouched() {
    let api = Arc::new(SwitchableApi::with_demo_data());
    let mut view = OverviewView::new(api.clone());
    view.load().await;
    let before = view.stats();
    let answered = api.answered_reads();

    api.set_latency(Duration::from_millis(50));
    let task = view.start_load();
    drop(task);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(api.answered_reads(), answered);
    assert_eq!(view.stats(), before);
    assert!(!view.backend_unavailable());
    assert_eq!(view.last_error(), None);
}
