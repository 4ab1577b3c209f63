//! Common test utilities for websettings integration tests
//!
//! Provides shared test fixtures, a sample setting catalogue, and helper functions.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::TempDir;
use websettings::{AppConfig, JsonStore, MapEnvSource, Setting, Settings};

// =============================================================================
// Sample Settings
// =============================================================================

/// A catalogue covering every setting kind, modelled on a DNS admin web app
pub fn sample_settings() -> Vec<Setting> {
    vec![
        Setting::bool("signup_enabled", true)
            .label("Allow users to sign up")
            .description("Show the registration form on the login page"),
        Setting::bool("pretty_ipv6_ptr", false),
        Setting::int("session_timeout", 10).label("Session timeout (minutes)"),
        Setting::float("default_record_ttl", 3600.0),
        Setting::string("site_name", "PowerDNS-Admin"),
        Setting::string("pdns_api_url", ""),
        Setting::string("pdns_api_key", "").prompts(json!({"input": "password"})),
        Setting::dict("oidc_oauth_claims", json!({})),
        Setting::list("allowed_ips", vec![]),
        Setting::any("custom_history_header", Value::Null),
    ]
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// Test fixture with a temporary app root and a JSON-backed registry
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub settings: Settings<JsonStore>,
    pub app: AppConfig,
}

impl TestFixture {
    /// Fixture with no environment variables set
    pub fn new() -> Self {
        Self::with_env(MapEnvSource::new())
    }

    /// Fixture reading environment variables from `env`
    pub fn with_env(env: MapEnvSource) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let settings = build_settings(&temp_dir, env);
        let app = AppConfig::new(temp_dir.path());

        Self {
            temp_dir,
            settings,
            app,
        }
    }

    /// App root directory (where config files are looked up)
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Path of the JSON store file
    pub fn store_path(&self) -> PathBuf {
        store_path(&self.temp_dir)
    }

    /// Write a config file under the app root
    pub fn write_config(&self, name: &str, content: &Value) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(content).unwrap()).unwrap();
        path
    }

    /// Write a plain file under the app root (e.g. a mounted secret)
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// A second registry over the same store, as a restarted process would see
    pub fn reopen(&self, env: MapEnvSource) -> Settings<JsonStore> {
        build_settings(&self.temp_dir, env)
    }
}

fn store_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("data").join("settings.json")
}

fn build_settings(temp_dir: &TempDir, env: MapEnvSource) -> Settings<JsonStore> {
    Settings::builder()
        .with_env_source(env)
        .with_store(JsonStore::new(store_path(temp_dir)))
        .register_all(sample_settings())
        .build()
}

/// Read the raw store file as JSON
pub fn read_store_file(fixture: &TestFixture) -> Value {
    let content = std::fs::read_to_string(fixture.store_path()).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// Stored text for `name`, if the store file has a record for it
pub fn stored_value(fixture: &TestFixture, name: &str) -> Option<Value> {
    if !fixture.store_path().exists() {
        return None;
    }
    read_store_file(fixture)
        .as_array()?
        .iter()
        .find(|record| record["name"] == name)
        .map(|record| record["value"].clone())
}
