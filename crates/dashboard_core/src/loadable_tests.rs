use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_loadable_starts_loading() {
    let state: Loadable<u32> = Loadable::default();
    assert!(state.is_loading());
    assert_eq!(state.ready(), None);
}

#[test]
fn test_apply_failure_before_data_marks_failed() {
    let mut state: Loadable<u32> = Loadable::Loading;

    state.apply(Err(Error::transport("connection refused")));

    assert_eq!(state.error(), Some("Request failed: connection refused"));
}

#[test]
fn test_apply_failure_keeps_loaded_data() {
    let mut state = Loadable::Ready(7);

    state.apply(Err(Error::status(500, "boom")));

    assert_eq!(state.ready(), Some(&7));
}

#[test]
fn test_apply_success_replaces_failure() {
    let mut state: Loadable<u32> = Loadable::Failed("earlier".to_string());

    state.apply(Ok(3));

    assert_eq!(state, Loadable::Ready(3));
}

#[tokio::test]
async fn test_view_task_join_returns_value() {
    let task = ViewTask::spawn(async { 41 + 1 });
    assert_eq!(task.join().await, Some(42));
}

#[tokio::test]
async fn test_dropping_view_task_aborts_fetch() {
    let completed = Arc::new(AtomicBool::new(false));
    let flag = completed.clone();

    let task = ViewTask::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        flag.store(true, Ordering::SeqCst);
    });
    drop(task);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!completed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_cancelled_view_task_joins_to_none() {
    let task = ViewTask::spawn(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        1
    });
    task.cancel();

    assert_eq!(task.join().await, None);
}
