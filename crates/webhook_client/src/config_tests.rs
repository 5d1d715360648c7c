use super::*;
use secrecy::SecretString;

fn credentials() -> BasicCredentials {
    BasicCredentials::new("admin", SecretString::from("password".to_string()))
}

#[test]
fn test_new_uses_default_timeout() {
    let config = ClientConfig::new(DEFAULT_BASE_URL, credentials()).unwrap();

    assert_eq!(config.base_url.as_str(), "http://localhost:8080/api");
    assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
}

#[test]
fn test_with_timeout_overrides_default() {
    let config = ClientConfig::new("https://hooks.example.com/api/", credentials())
        .unwrap()
        .with_timeout(None);

    assert_eq!(config.timeout, None);
}

#[test]
fn test_new_rejects_unparseable_url() {
    let result = ClientConfig::new("not a url", credentials());
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[test]
fn test_new_rejects_non_http_scheme() {
    let result = ClientConfig::new("ftp://example.com/api", credentials());
    assert!(matches!(result, Err(Error::Validation(_))));
}
