//! Comprehensive unit tests for config.rs module

use schoolbus_desk::config::{AppConfig, ViewConfig};
use schoolbus_desk::session::SessionPolicy;

#[test]
fn test_default_storage_and_session() {
    let config = AppConfig::default();

    assert_eq!(config.storage.data_dir, "data/schoolbus");
    assert_eq!(config.storage.attendance_cap, 200);
    assert_eq!(config.session.policy, SessionPolicy::PermissiveDemo);
    assert_eq!(config.session.landing_page, "index.html");
    assert_eq!(config.session.demo_token, "demo-token");
}

#[test]
fn test_default_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_default_view_config() {
    let view = ViewConfig::default();

    assert_eq!(view.student_page_size, 8);
    assert_eq!(view.recent_complaints_limit, 6);
    assert_eq!(view.incharge_attendance_limit, 50);
    assert_eq!(view.history_limit, 20);
    assert_eq!(view.search_debounce_ms, 250);
    assert_eq!(view.clock_tick_secs, 60);
}

#[test]
fn test_validate_rejects_bad_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_log_format() {
    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_attendance_cap() {
    let mut config = AppConfig::default();
    config.storage.attendance_cap = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_non_http_api_url() {
    let mut config = AppConfig::default();
    config.api.base_url = "ftp://example.com".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_landing_page() {
    let mut config = AppConfig::default();
    config.session.landing_page = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_yaml_round_trip_keeps_policy() {
    let mut config = AppConfig::default();
    config.session.policy = SessionPolicy::StrictRedirect;

    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("strict-redirect"));

    let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.session.policy, SessionPolicy::StrictRedirect);
    assert_eq!(parsed.view.student_page_size, config.view.student_page_size);
}

#[test]
fn test_session_policy_parsing() {
    assert_eq!("strict-redirect".parse::<SessionPolicy>(), Ok(SessionPolicy::StrictRedirect));
    assert_eq!(SessionPolicy::PermissiveDemo.to_string(), "permissive-demo");
    assert!("lenient".parse::<SessionPolicy>().is_err());
}
