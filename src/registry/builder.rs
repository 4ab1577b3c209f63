//! Builder for Settings
//!
//! This module contains [`SettingsBuilder`] which provides a fluent API
//! for creating a [`Settings`](super::Settings) registry.

use crate::config::SettingsConfigBuilder;
use crate::env::EnvSource;
use crate::setting::Setting;
use crate::store::{MemoryStore, SettingStore};
use std::sync::Arc;

use super::Settings;

/// Builder for creating a [`Settings`] registry with a fluent API.
///
/// Wraps a [`SettingsConfigBuilder`] and also collects the settings to
/// register, so bootstrap code can declare everything in one chain.
///
/// # Example
///
/// ```rust
/// use websettings::{MemoryStore, Setting, Settings};
/// use serde_json::json;
///
/// let settings = Settings::builder()
///     .with_store(MemoryStore::new())
///     .register(Setting::bool("signup_enabled", true).label("Allow signups"))
///     .register(Setting::dict("oidc_oauth_claims", json!({})))
///     .build();
///
/// assert_eq!(settings.len(), 2);
/// ```
pub struct SettingsBuilder<S: SettingStore = MemoryStore> {
    config_builder: SettingsConfigBuilder<S>,
    settings: Vec<Setting>,
}

impl Default for SettingsBuilder<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder<MemoryStore> {
    /// Create a new builder with an in-memory store and the process environment.
    pub fn new() -> Self {
        Self {
            config_builder: SettingsConfigBuilder::new(),
            settings: Vec::new(),
        }
    }
}

impl<S: SettingStore> SettingsBuilder<S> {
    /// Persist values in `store`.
    pub fn with_store<T: SettingStore>(self, store: T) -> SettingsBuilder<T> {
        SettingsBuilder {
            config_builder: self.config_builder.with_store(store),
            settings: self.settings,
        }
    }

    /// Read environment variables from `source` instead of the process.
    #[must_use]
    pub fn with_env_source(mut self, source: impl EnvSource + 'static) -> Self {
        self.config_builder = self.config_builder.with_env_source(source);
        self
    }

    #[must_use]
    pub fn with_shared_env_source(mut self, source: Arc<dyn EnvSource>) -> Self {
        self.config_builder = self.config_builder.with_shared_env_source(source);
        self
    }

    /// Set the Docker config file name (default: "docker_config.json").
    #[must_use]
    pub fn docker_config_file(mut self, name: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.docker_config_file(name);
        self
    }

    /// Set the fallback config file name (default: "default_config.json").
    #[must_use]
    pub fn default_config_file(mut self, name: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.default_config_file(name);
        self
    }

    /// Set the variable naming an extra config file (default: "FLASK_CONF").
    #[must_use]
    pub fn conf_env_var(mut self, name: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.conf_env_var(name);
        self
    }

    /// Register a setting. A later setting with the same name replaces an
    /// earlier one.
    #[must_use]
    pub fn register(mut self, setting: Setting) -> Self {
        self.settings.push(setting);
        self
    }

    /// Register several settings at once.
    #[must_use]
    pub fn register_all(mut self, settings: impl IntoIterator<Item = Setting>) -> Self {
        self.settings.extend(settings);
        self
    }

    /// Build the registry.
    pub fn build(self) -> Settings<S> {
        let mut registry = Settings::new(self.config_builder.build());
        for setting in self.settings {
            registry.register(setting);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvSource;
    use serde_json::json;

    #[test]
    fn test_later_registration_wins() {
        let settings = SettingsBuilder::new()
            .register(Setting::string("site_name", "first"))
            .register(Setting::string("site_name", "second"))
            .build();

        assert_eq!(settings.len(), 1);
        assert_eq!(settings.value("site_name"), Some(&json!("second")));
    }

    #[test]
    fn test_builder_forwards_config() {
        let settings = Settings::builder()
            .with_env_source(MapEnvSource::new().with("PDNS_CONF", "/etc/pdns.json"))
            .conf_env_var("PDNS_CONF")
            .docker_config_file("docker.json")
            .register_all([Setting::int("a", 1), Setting::int("b", 2)])
            .build();

        assert_eq!(settings.config_files().conf_env_var, "PDNS_CONF");
        assert_eq!(settings.config_files().docker, "docker.json");
        assert_eq!(settings.env().var("PDNS_CONF").unwrap().as_deref(), Some("/etc/pdns.json"));
        assert_eq!(settings.names(), vec!["a", "b"]);
    }
}
