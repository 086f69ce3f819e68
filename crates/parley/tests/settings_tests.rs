//! Tests for layered client settings.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use parley::settings::{ClientSettings, ENV_MAX_RECONNECT_ATTEMPTS, ENV_URL, SettingsError};
use parley::SessionConfig;

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
url = "wss://chat.example.com/ws"
max_reconnect_attempts = 5
initial_delay_ms = 500

[headers]
Authorization = "Bearer token"
"#
    )
    .unwrap();

    let settings = ClientSettings::load(file.path()).unwrap();
    assert_eq!(settings.url, "wss://chat.example.com/ws");
    assert_eq!(settings.max_reconnect_attempts, 5);
    assert_eq!(settings.initial_delay_ms, 500);
    // Keys not in the file keep their defaults.
    assert_eq!(settings.max_delay_ms, 10_000);
    assert_eq!(settings.backoff_multiplier, 2.0);

    let session = settings.session_config();
    assert_eq!(session.initial_delay, Duration::from_millis(500));
    assert_eq!(session.delay_for_attempt(1), Duration::from_millis(1000));

    let transport = settings.transport_config();
    assert_eq!(
        transport.headers.get("Authorization").map(String::as_str),
        Some("Bearer token")
    );
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    match ClientSettings::load(&path) {
        Err(SettingsError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn test_unknown_keys_are_rejected() {
    let result = ClientSettings::from_toml_str("retries = 3\n");
    assert!(matches!(result, Err(SettingsError::Parse(_))));
}

#[test]
fn test_empty_file_gives_defaults() {
    let settings = ClientSettings::from_toml_str("").unwrap();
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.session_config(), SessionConfig::default());
}

#[test]
fn test_environment_overrides_file() {
    let mut settings = ClientSettings::from_toml_str(
        r#"
url = "ws://from-file/ws"
max_reconnect_attempts = 5
"#,
    )
    .unwrap();

    settings
        .apply_overrides(env(&[
            (ENV_URL, "ws://from-env/ws"),
            (ENV_MAX_RECONNECT_ATTEMPTS, " 7 "),
        ]))
        .unwrap();

    assert_eq!(settings.url, "ws://from-env/ws");
    assert_eq!(settings.max_reconnect_attempts, 7);
}

#[test]
fn test_absent_environment_changes_nothing() {
    let mut settings = ClientSettings::default();
    settings.apply_overrides(env(&[])).unwrap();
    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn test_invalid_environment_value() {
    let mut settings = ClientSettings::default();
    let result = settings.apply_overrides(env(&[(ENV_MAX_RECONNECT_ATTEMPTS, "many")]));

    assert_eq!(
        result,
        Err(SettingsError::InvalidValue {
            key: ENV_MAX_RECONNECT_ATTEMPTS.to_string(),
            value: "many".to_string(),
        })
    );
    assert_eq!(settings.max_reconnect_attempts, 3);
}

#[test]
fn test_error_messages() {
    let err = SettingsError::InvalidValue {
        key: "url".into(),
        value: String::new(),
    };
    assert_eq!(err.to_string(), "invalid value for url: ''");
}
