//! The host application's config object
//!
//! Web frameworks keep a flat, UPPERCASE-keyed config map filled from
//! defaults files, an env-named file and values passed in at app creation.
//! [`AppConfig`] is that map. The registry merges sources into it and writes
//! every value it resolves back, so code reading `app["SESSION_TIMEOUT"]`
//! sees the same value as the registry.

use crate::error::{Error, Result};
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// =============================================================================
// Config File Formats
// =============================================================================

/// Format of a config file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    #[cfg(feature = "toml")]
    Toml,
}

impl ConfigFormat {
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            #[cfg(feature = "toml")]
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn parse(self, path: &Path, content: &str) -> Result<Map<String, Value>> {
        match self {
            ConfigFormat::Json => match serde_json::from_str::<Value>(content)
                .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?
            {
                Value::Object(map) => Ok(map),
                other => Err(Error::Config(format!(
                    "{} must contain an object at the top level, found {}",
                    path.display(),
                    crate::convert::json_type_name(&other)
                ))),
            },
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => toml::from_str::<Map<String, Value>>(content)
                .map_err(|e| Error::Parse(format!("{}: {e}", path.display()))),
        }
    }
}

/// Keys taken from config files: at least one letter and no lowercase ones
fn is_config_key(key: &str) -> bool {
    key.chars().any(char::is_alphabetic) && !key.chars().any(char::is_lowercase)
}

// =============================================================================
// Injected Config
// =============================================================================

/// Configuration handed to the application at creation time
#[derive(Debug, Clone, PartialEq)]
pub enum InjectedConfig {
    /// Values merged as-is
    Map(HashMap<String, Value>),
    /// A config file to load
    File(PathBuf),
}

impl From<HashMap<String, Value>> for InjectedConfig {
    fn from(map: HashMap<String, Value>) -> Self {
        InjectedConfig::Map(map)
    }
}

impl From<PathBuf> for InjectedConfig {
    fn from(path: PathBuf) -> Self {
        InjectedConfig::File(path)
    }
}

impl From<&Path> for InjectedConfig {
    fn from(path: &Path) -> Self {
        InjectedConfig::File(path.to_path_buf())
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Flat key/value config of the host application
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    root_path: PathBuf,
    values: HashMap<String, Value>,
}

impl AppConfig {
    /// Empty config for an application rooted at `root_path`.
    ///
    /// Supports `~` expansion for the home directory.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = root_path.into();
        let root_path = if path.starts_with("~") {
            match dirs::home_dir() {
                Some(home) => home.join(path.strip_prefix("~").unwrap_or(&path)),
                None => path,
            }
        } else {
            path
        };

        Self {
            root_path,
            values: HashMap::new(),
        }
    }

    /// Directory relative config paths are resolved against
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// Merge `entries` as-is (no key filtering)
    pub fn update<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.values
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v)));
    }

    /// Load UPPERCASE top-level keys from a JSON (or TOML) file.
    ///
    /// Relative paths are resolved against [`AppConfig::root_path`].
    /// Returns the number of keys taken from the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read, has an unknown extension,
    /// fails to parse, or isn't a table at the top level.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = self.resolve(path.as_ref());
        let format = ConfigFormat::from_path(&path)?;
        let content = crate::error::read_file(&path)?;
        let table = format.parse(&path, &content)?;

        let before = self.values.len();
        let mut taken = 0;
        for (key, value) in table {
            if is_config_key(&key) {
                self.values.insert(key, value);
                taken += 1;
            }
        }
        debug!(
            "Loaded {taken} config keys from {} ({} new)",
            path.display(),
            self.values.len() - before
        );
        Ok(taken)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        }
    }
}

static NULL: Value = Value::Null;

impl std::ops::Index<&str> for AppConfig {
    type Output = Value;

    /// Missing keys read as `Null`
    fn index(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NULL)
    }
}
