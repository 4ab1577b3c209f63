//! # websettings - typed web application settings
//!
//! A registry of named, typed settings for a web application. Each setting
//! declares its kind and default; live values are resolved from config files,
//! environment variables (or mounted secret files) and a persistent store, and
//! raw text input is coerced into the declared kind.
//!
//! ## Features
//!
//! - **Typed settings**: bool, int, float, dict, list, string or passthrough
//! - **Environment overrides**: `NAME` or `NAME_FILE` (e.g. Docker secrets)
//! - **Config merging**: Docker/default config files, a `FLASK_CONF` file and
//!   app-injected config, all merged into the host [`AppConfig`]
//! - **Persistence**: in-memory, JSON file or SQLite (`sqlite` feature) stores
//! - **Legacy values**: old `{'key': True}` style dicts and lists still load
//!
//! ## Quick Start
//!
//! ```rust
//! use websettings::{AppConfig, MapEnvSource, Setting, Settings};
//! use serde_json::json;
//!
//! # fn example() -> websettings::Result<()> {
//! let mut settings = Settings::builder()
//!     .with_env_source(MapEnvSource::new().with("SIGNUP_ENABLED", "False"))
//!     .register(Setting::bool("signup_enabled", true).label("Allow signups"))
//!     .register(Setting::int("session_timeout", 10))
//!     .register(Setting::dict("oidc_oauth_claims", json!({})))
//!     .build();
//!
//! let mut app = AppConfig::new(".");
//! settings.load_environment(&mut app, None)?;
//! settings.load_database()?;
//!
//! assert!(!settings.get("signup_enabled").unwrap().is_truthy());
//!
//! // Admin edit: convert, assign, persist
//! settings.set_value("session_timeout", json!("30"))?;
//! assert!(settings.save("session_timeout")?);
//!
//! // Environment values are never written back
//! assert!(!settings.save("signup_enabled")?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Resolution Order
//!
//! [`Settings::load_environment`] runs first and wins. For each setting it
//! looks at `NAME_FILE`, then `NAME`, then the merged host config. Anything it
//! finds is flagged as environment-sourced and won't be saved.
//! [`Settings::load_database`] then fills in the remaining settings from the
//! store. Settings found in neither keep their default.
//!
//! ## Stores
//!
//! ```rust,no_run
//! use websettings::{JsonStore, Settings};
//!
//! let settings = Settings::builder()
//!     .with_store(JsonStore::new("/var/lib/my-app/settings.json"))
//!     .build();
//! ```

// Core modules
mod error;
mod registry;
mod setting;

pub mod config;
pub mod convert;
pub mod env;
pub mod security;
pub mod store;

// Re-exports from core
pub use error::{Error, Result};
pub use registry::{Settings, SettingsBuilder};
pub use setting::{Setting, SettingKind};

// Re-exports from config
pub use config::{
    AppConfig, ConfigFiles, ConfigFormat, InjectedConfig, SettingsConfig, SettingsConfigBuilder,
};

pub use env::{DefaultEnvSource, EnvSource, EnvironmentHandler, MapEnvSource};

#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
pub use store::{JsonStore, MemoryStore, SettingRecord, SettingStore};
