//! Registry configuration

use std::sync::Arc;

use crate::env::{DefaultEnvSource, EnvSource};
use crate::store::{MemoryStore, SettingStore};

/// Default name of the Docker-specific config file under the app root
pub const DOCKER_CONFIG_FILE: &str = "docker_config.json";

/// Default name of the fallback config file under the app root
pub const DEFAULT_CONFIG_FILE: &str = "default_config.json";

/// Default environment variable naming an extra config file
pub const CONF_ENV_VAR: &str = "FLASK_CONF";

/// Config files merged by [`Settings::load_environment`](crate::Settings::load_environment)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFiles {
    /// Loaded instead of `default` when it exists under the app root
    pub docker: String,

    /// Loaded when `docker` is absent
    pub default: String,

    /// Environment variable holding the path of one more config file
    pub conf_env_var: String,
}

impl Default for ConfigFiles {
    fn default() -> Self {
        Self {
            docker: DOCKER_CONFIG_FILE.into(),
            default: DEFAULT_CONFIG_FILE.into(),
            conf_env_var: CONF_ENV_VAR.into(),
        }
    }
}

/// Configuration for initializing a [`Settings`](crate::Settings) registry
pub struct SettingsConfig<S: SettingStore = MemoryStore> {
    /// Where saved values live
    pub store: S,

    /// Where environment variables are read from
    pub env_source: Arc<dyn EnvSource>,

    /// Config files merged into the host config
    pub files: ConfigFiles,
}

impl Default for SettingsConfig<MemoryStore> {
    fn default() -> Self {
        Self {
            store: MemoryStore::new(),
            env_source: Arc::new(DefaultEnvSource),
            files: ConfigFiles::default(),
        }
    }
}

impl<S: SettingStore> std::fmt::Debug for SettingsConfig<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsConfig")
            .field("store", &self.store.backend_name())
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl SettingsConfig<MemoryStore> {
    /// Create a new builder for `SettingsConfig`
    ///
    /// # Example
    /// ```rust
    /// use websettings::{MapEnvSource, SettingsConfig};
    ///
    /// let config = SettingsConfig::builder()
    ///     .with_env_source(MapEnvSource::new().with("SITE_NAME", "dns"))
    ///     .conf_env_var("PDNS_ADMIN_CONF")
    ///     .build();
    /// assert_eq!(config.files.conf_env_var, "PDNS_ADMIN_CONF");
    /// ```
    pub fn builder() -> SettingsConfigBuilder<MemoryStore> {
        SettingsConfigBuilder::new()
    }
}

/// Builder for creating `SettingsConfig` with a fluent API
pub struct SettingsConfigBuilder<S: SettingStore = MemoryStore> {
    store: S,
    env_source: Arc<dyn EnvSource>,
    files: ConfigFiles,
}

impl Default for SettingsConfigBuilder<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsConfigBuilder<MemoryStore> {
    /// Builder with an in-memory store and the process environment
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            env_source: Arc::new(DefaultEnvSource),
            files: ConfigFiles::default(),
        }
    }
}

impl<S: SettingStore> SettingsConfigBuilder<S> {
    /// Persist values in `store` instead
    pub fn with_store<T: SettingStore>(self, store: T) -> SettingsConfigBuilder<T> {
        SettingsConfigBuilder {
            store,
            env_source: self.env_source,
            files: self.files,
        }
    }

    /// Read environment variables from `source` instead of the process
    #[must_use]
    pub fn with_env_source(mut self, source: impl EnvSource + 'static) -> Self {
        self.env_source = Arc::new(source);
        self
    }

    /// Share an existing environment source
    #[must_use]
    pub fn with_shared_env_source(mut self, source: Arc<dyn EnvSource>) -> Self {
        self.env_source = source;
        self
    }

    /// Docker-specific config file name (default: `docker_config.json`)
    #[must_use]
    pub fn docker_config_file(mut self, name: impl Into<String>) -> Self {
        self.files.docker = name.into();
        self
    }

    /// Fallback config file name (default: `default_config.json`)
    #[must_use]
    pub fn default_config_file(mut self, name: impl Into<String>) -> Self {
        self.files.default = name.into();
        self
    }

    /// Variable naming an extra config file (default: `FLASK_CONF`)
    #[must_use]
    pub fn conf_env_var(mut self, name: impl Into<String>) -> Self {
        self.files.conf_env_var = name.into();
        self
    }

    pub fn build(self) -> SettingsConfig<S> {
        SettingsConfig {
            store: self.store,
            env_source: self.env_source,
            files: self.files,
        }
    }
}
