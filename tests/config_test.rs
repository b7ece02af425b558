use listq::config::{Config, DEFAULT_HOST, DEFAULT_QUEUE_KEY};
use listq::error::Error;
use secrecy::ExposeSecret;
use std::time::Duration;

const VARS: &[&str] = &[
    "LISTQ_HOST",
    "LISTQ_PORT",
    "LISTQ_DB",
    "LISTQ_PASSWORD",
    "LISTQ_KEY",
    "LISTQ_TIMEOUT_MS",
    "LISTQ_BACKOFF_BASE_MS",
    "LISTQ_BACKOFF_STEP_MS",
    "LISTQ_BACKOFF_CAP_MS",
];

fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

// Environment is process-global, so every env scenario runs in this one test.
#[test]
fn config_from_env() {
    clear_env();
    let err = Config::from_env().unwrap_err();
    assert!(
        err.to_string().contains("LISTQ_TIMEOUT_MS"),
        "timeout must be required, got {err}"
    );

    unsafe { std::env::set_var("LISTQ_TIMEOUT_MS", "2500") };
    let config = Config::from_env().unwrap();
    assert_eq!(config.store.host, DEFAULT_HOST);
    assert_eq!(config.store.port, 6379);
    assert_eq!(config.store.db, 0);
    assert!(config.store.password.is_none());
    assert_eq!(config.queue_key, DEFAULT_QUEUE_KEY);
    assert_eq!(config.timeout, Duration::from_millis(2500));
    assert!(!config.log_level.is_empty());

    unsafe {
        std::env::set_var("LISTQ_HOST", "redis.internal");
        std::env::set_var("LISTQ_PORT", "6380");
        std::env::set_var("LISTQ_DB", "3");
        std::env::set_var("LISTQ_PASSWORD", "hunter2");
        std::env::set_var("LISTQ_KEY", "quotes");
        std::env::set_var("LISTQ_BACKOFF_BASE_MS", "500");
        std::env::set_var("LISTQ_BACKOFF_STEP_MS", "250");
        std::env::set_var("LISTQ_BACKOFF_CAP_MS", "10000");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.store.host, "redis.internal");
    assert_eq!(config.store.port, 6380);
    assert_eq!(config.store.db, 3);
    assert_eq!(
        config.store.password.as_ref().map(|p| p.expose_secret().to_string()),
        Some("hunter2".to_string())
    );
    assert!(!format!("{config:?}").contains("hunter2"));
    assert_eq!(config.queue_key, "quotes");
    assert_eq!(config.backoff.base, Duration::from_millis(500));
    assert_eq!(config.backoff.step, Duration::from_millis(250));
    assert_eq!(config.backoff.cap, Duration::from_secs(10));

    unsafe { std::env::set_var("LISTQ_PORT", "not-a-port") };
    assert!(matches!(Config::from_env(), Err(Error::Config(_))));

    unsafe { std::env::set_var("LISTQ_PORT", "6379") };
    unsafe { std::env::set_var("LISTQ_TIMEOUT_MS", "0") };
    assert!(matches!(Config::from_env(), Err(Error::Config(_))));

    clear_env();
}

#[test]
fn config_from_toml_file() {
    let path = std::env::temp_dir().join(format!("listq-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"
[store]
host = "10.0.0.5"
db = 2

[queue]
key = "scraped:quotes"
timeout_ms = 750

[backoff]
base_ms = 1000
step_ms = 1000
cap_ms = 45000

[telemetry]
log_level = "debug"
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.store.host, "10.0.0.5");
    assert_eq!(config.store.port, 6379);
    assert_eq!(config.store.db, 2);
    assert_eq!(config.queue_key, "scraped:quotes");
    assert_eq!(config.timeout, Duration::from_millis(750));
    assert_eq!(config.backoff.cap, Duration::from_secs(45));
    assert_eq!(config.log_level, "debug");
    assert!(config.otel_endpoint.is_none());

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_config_file_is_a_config_error() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/listq.toml")).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}

#[test]
fn empty_queue_key_is_rejected() {
    let err = Config::from_toml_str("[queue]\nkey = \"  \"\ntimeout_ms = 10\n").unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}
