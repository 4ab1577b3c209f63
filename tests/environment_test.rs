//! Environment Loading Integration Tests
//!
//! Tests for `load_environment` including:
//! - Config file precedence (Docker, default, FLASK_CONF, injected)
//! - `NAME` and `NAME_FILE` variables
//! - Interaction with `load_database` and `save`

mod common;

use common::{TestFixture, stored_value};
use serde_json::json;
use std::collections::HashMap;
use websettings::{Error, InjectedConfig, MapEnvSource};

// =============================================================================
// Config Files
// =============================================================================

#[test]
fn test_default_config_file_is_loaded() {
    let mut fixture = TestFixture::new();
    fixture.write_config(
        "default_config.json",
        &json!({"SITE_NAME": "Default DNS", "SESSION_TIMEOUT": "5", "lowercase_key": 1}),
    );

    let resolved = fixture
        .settings
        .load_environment(&mut fixture.app, None)
        .unwrap();

    assert_eq!(resolved, 2);
    assert_eq!(fixture.settings.value("site_name"), Some(&json!("Default DNS")));
    assert_eq!(fixture.app["SESSION_TIMEOUT"], json!(5));
    assert!(!fixture.app.contains_key("lowercase_key"));
}

#[test]
fn test_docker_config_replaces_default() {
    let mut fixture = TestFixture::new();
    fixture.write_config("default_config.json", &json!({"SITE_NAME": "Default DNS"}));
    fixture.write_config("docker_config.json", &json!({"PDNS_API_URL": "http://pdns:8081"}));

    fixture
        .settings
        .load_environment(&mut fixture.app, None)
        .unwrap();

    assert_eq!(
        fixture.settings.value("pdns_api_url"),
        Some(&json!("http://pdns:8081"))
    );
    // The default file is skipped entirely when the Docker file exists
    assert_eq!(fixture.settings.value("site_name"), Some(&json!("PowerDNS-Admin")));
    assert!(!fixture.settings.get("site_name").unwrap().is_loaded());
}

#[test]
fn test_conf_env_var_then_injected_config() {
    let probe = TestFixture::new();
    let conf = probe.write_config(
        "production.json",
        &json!({"SITE_NAME": "From FLASK_CONF", "SESSION_TIMEOUT": 30}),
    );
    probe.write_config("default_config.json", &json!({"SITE_NAME": "Default DNS"}));

    let env = MapEnvSource::new().with("FLASK_CONF", conf.to_string_lossy());
    let mut settings = probe.reopen(env);
    let mut app = websettings::AppConfig::new(probe.root());

    let injected: HashMap<String, serde_json::Value> =
        [("SESSION_TIMEOUT".to_string(), json!(60))].into_iter().collect();
    settings
        .load_environment(&mut app, Some(InjectedConfig::from(injected)))
        .unwrap();

    assert_eq!(settings.value("site_name"), Some(&json!("From FLASK_CONF")));
    assert_eq!(settings.value("session_timeout"), Some(&json!(60)));
}

#[test]
fn test_injected_config_file() {
    let mut fixture = TestFixture::new();
    let path = fixture.write_config("app.json", &json!({"ALLOWED_IPS": "['10.0.0.0/8']"}));

    fixture
        .settings
        .load_environment(&mut fixture.app, Some(InjectedConfig::File(path)))
        .unwrap();

    assert_eq!(fixture.settings.value("allowed_ips"), Some(&json!(["10.0.0.0/8"])));
    assert_eq!(fixture.app["ALLOWED_IPS"], json!(["10.0.0.0/8"]));
}

#[test]
fn test_injected_file_with_unknown_extension() {
    let mut fixture = TestFixture::new();
    let path = fixture.write_file("app.ini", "SITE_NAME=x");

    let err = fixture
        .settings
        .load_environment(&mut fixture.app, Some(InjectedConfig::File(path)))
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}

#[test]
fn test_broken_config_file() {
    let mut fixture = TestFixture::new();
    fixture.write_file("default_config.json", "{ not json");

    let err = fixture
        .settings
        .load_environment(&mut fixture.app, None)
        .unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

// =============================================================================
// Environment Variables
// =============================================================================

#[test]
fn test_env_var_overrides_config() {
    let probe = TestFixture::new();
    probe.write_config("default_config.json", &json!({"SIGNUP_ENABLED": false}));

    let mut settings = probe.reopen(MapEnvSource::new().with("SIGNUP_ENABLED", "1"));
    let mut app = websettings::AppConfig::new(probe.root());
    settings.load_environment(&mut app, None).unwrap();

    assert_eq!(settings.value("signup_enabled"), Some(&json!(true)));
    assert_eq!(app["SIGNUP_ENABLED"], json!(true));
}

#[test]
fn test_file_variable_reads_secret() {
    let probe = TestFixture::new();
    let secret = probe.write_file("pdns_api_key", "s3cr3t\n");

    let env = MapEnvSource::new().with("PDNS_API_KEY_FILE", secret.to_string_lossy());
    let mut settings = probe.reopen(env);
    let mut app = websettings::AppConfig::new(probe.root());
    settings.load_environment(&mut app, None).unwrap();

    assert_eq!(settings.value("pdns_api_key"), Some(&json!("s3cr3t")));
    assert!(settings.get("pdns_api_key").unwrap().is_environment());
}

#[test]
fn test_missing_secret_file() {
    let probe = TestFixture::new();
    let env = MapEnvSource::new().with(
        "PDNS_API_KEY_FILE",
        probe.root().join("missing").to_string_lossy(),
    );
    let mut settings = probe.reopen(env);
    let mut app = websettings::AppConfig::new(probe.root());

    let err = settings.load_environment(&mut app, None).unwrap_err();
    assert!(matches!(err, Error::FileRead { .. }));
}

#[test]
fn test_name_and_file_variables_conflict() {
    let probe = TestFixture::new();
    let secret = probe.write_file("key", "from-file");
    let env = MapEnvSource::new()
        .with("PDNS_API_KEY", "from-env")
        .with("PDNS_API_KEY_FILE", secret.to_string_lossy());

    let mut settings = probe.reopen(env);
    let mut app = websettings::AppConfig::new(probe.root());
    let err = settings.load_environment(&mut app, None).unwrap_err();

    match err {
        Error::ConflictingEnvironment { name, file_name } => {
            assert_eq!(name, "PDNS_API_KEY");
            assert_eq!(file_name, "PDNS_API_KEY_FILE");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_bad_env_value_is_error() {
    let probe = TestFixture::new();
    let mut settings = probe.reopen(MapEnvSource::new().with("SESSION_TIMEOUT", "soon"));
    let mut app = websettings::AppConfig::new(probe.root());

    assert!(
        settings
            .load_environment(&mut app, None)
            .unwrap_err()
            .is_invalid_value()
    );
}

// =============================================================================
// Interaction With The Store
// =============================================================================

#[test]
fn test_environment_values_are_not_saved() {
    let probe = TestFixture::new();
    let mut settings = probe.reopen(MapEnvSource::new().with("SITE_NAME", "From Env"));
    let mut app = websettings::AppConfig::new(probe.root());
    settings.load_environment(&mut app, None).unwrap();

    assert!(!settings.save("site_name").unwrap());
    assert_eq!(stored_value(&probe, "site_name"), None);

    // Admin edits keep the environment flag, so they aren't saved either
    settings.set_value("site_name", json!("Edited")).unwrap();
    assert!(!settings.save("site_name").unwrap());
    assert_eq!(stored_value(&probe, "site_name"), None);
}

#[test]
fn test_database_does_not_override_environment() {
    let mut fixture = TestFixture::new();
    fixture.settings.set_value("session_timeout", json!(99)).unwrap();
    fixture.settings.set_value("site_name", json!("Stored DNS")).unwrap();
    assert!(fixture.settings.save("session_timeout").unwrap());
    assert!(fixture.settings.save("site_name").unwrap());

    let mut settings = fixture.reopen(MapEnvSource::new().with("SESSION_TIMEOUT", "20"));
    let mut app = websettings::AppConfig::new(fixture.root());
    assert_eq!(settings.load_environment(&mut app, None).unwrap(), 1);
    assert_eq!(settings.load_database().unwrap(), 1);

    assert_eq!(settings.value("session_timeout"), Some(&json!(20)));
    assert_eq!(settings.value("site_name"), Some(&json!("Stored DNS")));
    assert_eq!(stored_value(&fixture, "session_timeout"), Some(json!("99")));
}
