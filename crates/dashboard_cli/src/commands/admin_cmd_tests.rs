use super::*;
use crate::output::OutputFormat;
use webhook_client::memory::{DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD};

#[tokio::test]
async fn test_login_with_demo_admin() {
    let context = Context::standalone(OutputFormat::Json);

    let output = execute(
        AdminCommands::Login {
            email: DEMO_ADMIN_EMAIL.to_string(),
            password: Some(DEMO_ADMIN_PASSWORD.to_string()),
        },
        &context,
    )
    .await
    .unwrap();
    let admin: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(admin["email"], DEMO_ADMIN_EMAIL);
    assert!(admin["lastLogin"].is_string());
    assert!(admin.get("password").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let context = Context::standalone(OutputFormat::Pretty);

    let error = execute(
        AdminCommands::Login {
            email: DEMO_ADMIN_EMAIL.to_string(),
            password: Some("nope".to_string()),
        },
        &context,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        error,
        Error::Api(webhook_client::Error::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_register_prints_new_admin() {
    let context = Context::standalone(OutputFormat::Pretty);

    let output = execute(
        AdminCommands::Register {
            email: "ops@example.com".to_string(),
            name: "Ops Team".to_string(),
            password: Some("hunter22".to_string()),
        },
        &context,
    )
    .await
    .unwrap();

    assert!(output.contains("Registered Ops Team <ops@example.com>"));
    assert!(output.contains("Last login: never"));
    assert!(!output.contains("hunter22"));
}

#[tokio::test]
async fn test_register_rejects_malformed_email() {
    let context = Context::standalone(OutputFormat::Pretty);

    let error = execute(
        AdminCommands::Register {
            email: "ops".to_string(),
            name: "Ops".to_string(),
            password: Some("pw".to_string()),
        },
        &context,
    )
    .await
    .unwrap_err();

    assert_eq!(error.exit_code(), 2);
}
