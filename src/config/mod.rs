//! Configuration types
//!
//! - `SettingsConfig` - how a registry is wired (store, env source, file names)
//! - `AppConfig` - the host application's flat config map
//! - `InjectedConfig` - config passed in at application creation

mod app;
mod types;

pub use app::{AppConfig, ConfigFormat, InjectedConfig};
pub use types::{
    CONF_ENV_VAR, ConfigFiles, DEFAULT_CONFIG_FILE, DOCKER_CONFIG_FILE, SettingsConfig,
    SettingsConfigBuilder,
};
