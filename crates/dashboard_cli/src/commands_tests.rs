use super::*;

#[test]
fn test_is_yes() {
    assert!(is_yes("y"));
    assert!(is_yes(" YES "));
    assert!(!is_yes(""));
    assert!(!is_yes("no"));
    assert!(!is_yes("yep"));
}

#[test]
fn test_loaded_reports_failure_message() {
    let failed: Loadable<Vec<u32>> = Loadable::Failed("connection refused".to_string());
    let ready = Loadable::Ready(vec![1, 2]);

    assert!(matches!(loaded(&failed), Err(Error::Unavailable(m)) if m == "connection refused"));
    assert_eq!(loaded(&ready).unwrap(), &vec![1, 2]);
}

#[test]
fn test_connect_standalone_needs_no_credentials() {
    let context = Context::connect(&AppConfig::default(), true, OutputFormat::Json).unwrap();
    assert!(context.is_json());
}

#[test]
fn test_connect_without_password_fails() {
    let result = Context::connect(&AppConfig::default(), false, OutputFormat::Pretty);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_finish_returns_task_output() {
    let task = ViewTask::spawn(async { "done" });
    assert_eq!(finish(task).await.unwrap(), "done");
}

#[tokio::test]
async fn test_finish_of_cancelled_task_is_cancelled() {
    let task = ViewTask::spawn(async {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    });
    task.cancel();

    let error = finish(task).await.unwrap_err();
    assert_eq!(error.exit_code(), 130);
}
