//! Environment variable handling for settings
//!
//! A setting named `mail_server` is read from `MAIL_SERVER`, or from the
//! file whose path is in `MAIL_SERVER_FILE` (Docker/Kubernetes secrets).
//! Setting both is a configuration error.

use crate::error::{Error, Result};
use log::debug;
use std::collections::HashMap;
use std::env::VarError;
use std::path::Path;
use std::sync::Arc;

/// Source of environment variables
///
/// The registry never reads `std::env` directly, so tests and embedders can
/// hand it a fixed map instead.
pub trait EnvSource: Send + Sync {
    /// Look up a variable, with the same contract as [`std::env::var`]
    fn var(&self, key: &str) -> std::result::Result<String, VarError>;

    /// Whether `key` is set at all, even to a value that isn't valid UTF-8
    fn contains(&self, key: &str) -> bool {
        !matches!(self.var(key), Err(VarError::NotPresent))
    }
}

/// Reads the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEnvSource;

impl EnvSource for DefaultEnvSource {
    fn var(&self, key: &str) -> std::result::Result<String, VarError> {
        std::env::var(key)
    }
}

/// Fixed set of variables
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnvSource {
    fn var(&self, key: &str) -> std::result::Result<String, VarError> {
        self.vars.get(key).cloned().ok_or(VarError::NotPresent)
    }
}

/// Resolves a setting's raw value from `NAME` / `NAME_FILE`
#[derive(Clone)]
pub struct EnvironmentHandler {
    source: Arc<dyn EnvSource>,
}

impl EnvironmentHandler {
    pub fn new(source: Arc<dyn EnvSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn EnvSource> {
        &self.source
    }

    /// Value of `key`, or `None` if it isn't set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingValue`] if the value isn't valid UTF-8.
    pub fn var(&self, key: &str) -> Result<Option<String>> {
        match self.source.var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(Error::invalid(key, "not valid UTF-8")),
        }
    }

    /// Raw value for the setting exposed as `env_name`.
    ///
    /// `{env_name}_FILE` wins and its file content is returned with one
    /// trailing line ending removed. Otherwise `{env_name}` is returned as is.
    ///
    /// # Errors
    ///
    /// - [`Error::ConflictingEnvironment`] if both variables are set
    /// - [`Error::FileRead`] if the `_FILE` path can't be read
    /// - [`Error::InvalidSettingValue`] if a variable isn't valid UTF-8
    pub fn lookup(&self, env_name: &str) -> Result<Option<String>> {
        let file_name = format!("{env_name}_FILE");

        if let Some(path) = self.var(&file_name)? {
            if self.source.contains(env_name) {
                return Err(Error::ConflictingEnvironment {
                    name: env_name.to_string(),
                    file_name,
                });
            }
            debug!("Reading {env_name} from file {path}");
            let content = crate::error::read_file(Path::new(&path))?;
            return Ok(Some(strip_line_ending(content)));
        }

        self.var(env_name)
    }
}

fn strip_line_ending(mut content: String) -> String {
    if content.ends_with('\n') {
        content.pop();
        if content.ends_with('\r') {
            content.pop();
        }
    }
    content
}
