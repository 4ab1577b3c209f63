//! The settings registry
//!
//! This module contains [`Settings`], the name → [`Setting`] map that
//! application code reads from.

mod builder;
mod load;

pub use builder::SettingsBuilder;

use crate::config::{ConfigFiles, SettingsConfig};
use crate::convert;
use crate::env::EnvironmentHandler;
use crate::error::{Error, Result};
use crate::setting::Setting;
use crate::store::{MemoryStore, SettingRecord, SettingStore};

use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;

/// Registry of typed settings.
///
/// The registry is built once during bootstrap, filled with every known
/// [`Setting`], then resolved in two passes:
///
/// 1. [`Settings::load_environment`] - host config files, injected config and
///    environment variables. Values found here are final and never persisted.
/// 2. [`Settings::load_database`] - saved values for everything not resolved
///    in the first pass.
///
/// There is no global instance; pass the registry (or a reference) to the
/// components that need it.
///
/// # Example
///
/// ```rust
/// use websettings::{AppConfig, MapEnvSource, Setting, Settings};
///
/// let mut settings = Settings::builder()
///     .with_env_source(MapEnvSource::new().with("SESSION_TIMEOUT", "30"))
///     .register(Setting::int("session_timeout", 10))
///     .register(Setting::bool("signup_enabled", true))
///     .build();
///
/// let mut app = AppConfig::new(".");
/// settings.load_environment(&mut app, None)?;
/// settings.load_database()?;
///
/// assert_eq!(settings.get_as::<i64>("session_timeout")?, 30);
/// assert_eq!(app["SESSION_TIMEOUT"], 30);
/// # Ok::<(), websettings::Error>(())
/// ```
///
/// # Type Parameters
///
/// * `S`: The setting store (defaults to [`MemoryStore`]).
pub struct Settings<S: SettingStore = MemoryStore> {
    /// Registered settings by name
    cache: HashMap<String, Setting>,

    /// Persisted values
    store: S,

    /// Environment variable handler
    env: EnvironmentHandler,

    /// Config files merged by `load_environment`
    files: ConfigFiles,
}

impl Settings {
    /// Create a builder for `Settings` with a fluent API.
    pub fn builder() -> SettingsBuilder<MemoryStore> {
        SettingsBuilder::new()
    }
}

impl<S: SettingStore> Settings<S> {
    /// Create an empty registry from `config`
    pub fn new(config: SettingsConfig<S>) -> Self {
        info!(
            "Initialized settings registry with {} store",
            config.store.backend_name()
        );

        Self {
            cache: HashMap::new(),
            store: config.store,
            env: EnvironmentHandler::new(config.env_source),
            files: config.files,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn env(&self) -> &EnvironmentHandler {
        &self.env
    }

    pub fn config_files(&self) -> &ConfigFiles {
        &self.files
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Store `setting` under `name`, returning the one it replaced
    pub fn set(&mut self, name: impl Into<String>, setting: Setting) -> Option<Setting> {
        self.cache.insert(name.into(), setting)
    }

    /// Store `setting` under its own name
    pub fn register(&mut self, setting: Setting) -> Option<Setting> {
        let name = setting.name().to_string();
        self.set(name, setting)
    }

    pub fn remove(&mut self, name: &str) -> Option<Setting> {
        self.cache.remove(name)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn has(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Cached setting, or `None` if it isn't registered
    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.cache.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Setting> {
        self.cache.get_mut(name)
    }

    /// Re-read `name` from the store, refresh the cached value and return it.
    ///
    /// The cached value is only replaced when the store has a record. Returns
    /// `Ok(None)` for unregistered names without touching the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails or the stored text can't be
    /// converted to the declared kind.
    pub fn get_uncached(&mut self, name: &str) -> Result<Option<&Setting>> {
        if !self.has(name) {
            return Ok(None);
        }

        if let Some(record) = self.store.find(name)? {
            let value = self.convert_record(record)?;
            if let Some(setting) = self.cache.get_mut(name) {
                debug!("Refreshed setting {name} from the store");
                setting.set_value(value);
            }
        }

        Ok(self.cache.get(name))
    }

    /// Current value of `name`
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.cache.get(name).map(Setting::value)
    }

    /// Current value of `name`, or `default` if it isn't registered
    pub fn value_or(&self, name: &str, default: Value) -> Value {
        self.value(name).cloned().unwrap_or(default)
    }

    /// Deserialize the current value of `name` into `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::SettingNotFound`] if `name` isn't registered
    /// - [`Error::Parse`] if the value doesn't fit `T`
    pub fn get_as<T>(&self, name: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let value = self
            .value(name)
            .ok_or_else(|| Error::SettingNotFound(name.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Parse(format!("{name}: {e}")))
    }

    /// Every registered setting
    pub fn all(&self) -> &HashMap<String, Setting> {
        &self.cache
    }

    /// Name → current value for every registered setting
    pub fn flatten(&self) -> HashMap<String, Value> {
        self.cache
            .iter()
            .map(|(name, setting)| (name.clone(), setting.value().clone()))
            .collect()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cache.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    // =========================================================================
    // Conversion and writes
    // =========================================================================

    /// Coerce raw input into the declared kind of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingValue`] if `name` isn't registered or the
    /// input can't be read as its kind, and [`Error::TypeMismatch`] if a parsed
    /// dict/list has the wrong shape.
    pub fn convert_type(&self, name: &str, raw: Value) -> Result<Value> {
        let kind = self
            .cache
            .get(name)
            .map(Setting::kind)
            .ok_or_else(|| Error::invalid(name, format!("Setting does not exist: {name}")))?;
        convert::convert(name, kind, raw)
    }

    /// Convert `raw` and make it the current value of `name`.
    ///
    /// The setting is marked loaded; where it was loaded from is unchanged, so
    /// a value that came from the environment still won't be saved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SettingNotFound`] for unregistered names, or a
    /// conversion error.
    pub fn set_value(&mut self, name: &str, raw: Value) -> Result<()> {
        if !self.has(name) {
            return Err(Error::SettingNotFound(name.to_string()));
        }
        let value = self.convert_type(name, raw)?;
        if let Some(setting) = self.cache.get_mut(name) {
            setting.mark_loaded(value);
        }
        Ok(())
    }

    /// Persist the current value of `name`. See [`Setting::save`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::SettingNotFound`] for unregistered names. Store
    /// failures are reported as `Ok(false)`.
    pub fn save(&mut self, name: &str) -> Result<bool> {
        let setting = self
            .cache
            .get(name)
            .ok_or_else(|| Error::SettingNotFound(name.to_string()))?;
        Ok(setting.save(&mut self.store))
    }

    pub(crate) fn convert_record(&self, record: SettingRecord) -> Result<Value> {
        let raw = record.value.map_or(Value::Null, Value::String);
        self.convert_type(&record.name, raw)
    }
}

impl<S: SettingStore> std::fmt::Debug for Settings<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("settings", &self.names())
            .field("store", &self.store.backend_name())
            .field("files", &self.files)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvSource;
    use serde_json::json;

    fn registry() -> Settings {
        Settings::builder()
            .with_env_source(MapEnvSource::new())
            .register(Setting::bool("signup_enabled", true))
            .register(Setting::int("session_timeout", 10))
            .register(Setting::dict("oidc_oauth_claims", json!({})))
            .register(Setting::list("allowed_ips", vec![]))
            .register(Setting::string("site_name", "PowerDNS-Admin"))
            .build()
    }

    #[test]
    fn test_lookup_with_default_fallback() {
        let settings = registry();

        assert!(settings.has("site_name"));
        assert!(!settings.has("nope"));
        assert!(settings.get("nope").is_none());
        assert_eq!(settings.value("session_timeout"), Some(&json!(10)));
        assert_eq!(settings.value_or("nope", json!("fallback")), json!("fallback"));
        assert_eq!(settings.names().len(), 5);
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut settings = registry();
        let old = settings.set("site_name", Setting::string("site_name", "DNS"));

        assert_eq!(old.unwrap().value(), &json!("PowerDNS-Admin"));
        assert_eq!(settings.value("site_name"), Some(&json!("DNS")));
        assert_eq!(settings.len(), 5);
    }

    #[test]
    fn test_convert_type_dispatches_on_kind() {
        let settings = registry();

        assert_eq!(
            settings.convert_type("signup_enabled", json!("True")).unwrap(),
            json!(true)
        );
        assert_eq!(
            settings.convert_type("session_timeout", json!("45")).unwrap(),
            json!(45)
        );
        assert_eq!(
            settings
                .convert_type("oidc_oauth_claims", json!("{'admin': True}"))
                .unwrap(),
            json!({"admin": true})
        );
        assert_eq!(
            settings.convert_type("site_name", json!(12)).unwrap(),
            json!("12")
        );
    }

    #[test]
    fn test_convert_type_unknown_setting() {
        let settings = registry();
        let err = settings.convert_type("nope", json!("1")).unwrap_err();
        assert!(matches!(err, Error::InvalidSettingValue { .. }));
    }

    #[test]
    fn test_collection_round_trip_through_storage_text() {
        let settings = registry();
        let claims = json!({"groups": ["a", "b"], "admin": false, "depth": 2});
        let text = convert::encode_for_storage(&claims).unwrap();

        assert_eq!(
            settings.convert_type("oidc_oauth_claims", json!(text)).unwrap(),
            claims
        );

        let ips = json!(["10.0.0.1", "10.0.0.2"]);
        let text = convert::encode_for_storage(&ips).unwrap();
        assert_eq!(settings.convert_type("allowed_ips", json!(text)).unwrap(), ips);
    }

    #[test]
    fn test_get_as_typed() {
        let settings = registry();
        let timeout: i64 = settings.get_as("session_timeout").unwrap();
        assert_eq!(timeout, 10);

        assert!(settings.get_as::<bool>("session_timeout").is_err());
        assert!(settings.get_as::<i64>("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_set_value_and_save() {
        let mut settings = registry();
        settings.set_value("session_timeout", json!("30")).unwrap();

        assert!(settings.get("session_timeout").unwrap().is_loaded());
        assert!(settings.save("session_timeout").unwrap());

        let record = settings.store().find("session_timeout").unwrap().unwrap();
        assert_eq!(record.value.as_deref(), Some("30"));
    }

    #[test]
    fn test_save_unknown_setting() {
        let mut settings = registry();
        assert!(settings.save("nope").unwrap_err().is_not_found());
        assert!(settings.set_value("nope", json!(1)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_get_uncached_refreshes_from_store() {
        let mut settings = registry();
        settings
            .store_mut()
            .upsert("session_timeout", Some("90"))
            .unwrap();

        // The cache still holds the old value until asked for a fresh read
        assert_eq!(settings.value("session_timeout"), Some(&json!(10)));

        let setting = settings.get_uncached("session_timeout").unwrap().unwrap();
        assert_eq!(setting.value(), &json!(90));
        assert_eq!(settings.value("session_timeout"), Some(&json!(90)));
    }

    #[test]
    fn test_get_uncached_without_record_keeps_value() {
        let mut settings = registry();
        let setting = settings.get_uncached("site_name").unwrap().unwrap();
        assert_eq!(setting.value(), &json!("PowerDNS-Admin"));
        assert!(settings.get_uncached("nope").unwrap().is_none());
    }

    #[test]
    fn test_flatten() {
        let settings = registry();
        let flat = settings.flatten();
        assert_eq!(flat["signup_enabled"], json!(true));
        assert_eq!(flat["allowed_ips"], json!([]));
    }
}
