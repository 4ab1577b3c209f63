//! A single named, typed setting

use crate::convert::{self, TRUTHY_TOKENS};
use crate::error::{Error, Result};
use crate::store::SettingStore;
use log::{debug, error};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Setting Kind
// =============================================================================

/// Declared type of a setting
///
/// Raw input is coerced into this kind by [`convert::convert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Bool,
    Int,
    Float,
    Dict,
    List,
    #[default]
    String,
    /// No coercion, the value is kept as given
    Any,
}

impl SettingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKind::Bool => "bool",
            SettingKind::Int => "int",
            SettingKind::Float => "float",
            SettingKind::Dict => "dict",
            SettingKind::List => "list",
            SettingKind::String => "string",
            SettingKind::Any => "any",
        }
    }

    /// `true` for the kinds that have a length
    pub fn is_collection(&self) -> bool {
        matches!(self, SettingKind::Dict | SettingKind::List)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SettingKind::Int | SettingKind::Float)
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Setting
// =============================================================================

/// A named, typed value with UI metadata.
///
/// A setting starts out holding its default. Loaders replace the value and
/// flip `loaded`; values that came from the environment or host config also
/// flip `environment`, which keeps [`Setting::save`] from writing them to the
/// store.
///
/// # Example
///
/// ```
/// use websettings::Setting;
///
/// let setting = Setting::bool("signup_enabled", true)
///     .label("Allow sign-up")
///     .description("Let visitors create their own account");
///
/// assert!(setting.is_truthy());
/// assert_eq!(setting.env_name(), "SIGNUP_ENABLED");
/// ```
///
/// Settings are only built in code, never deserialized, so the `loaded` and
/// `environment` flags can only be set by the loaders:
///
/// ```compile_fail
/// let setting: websettings::Setting =
///     serde_json::from_str(r#"{"name": "a", "environment": true}"#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    name: String,
    kind: SettingKind,
    default: Value,
    value: Value,
    label: Option<String>,
    description: Option<String>,

    /// Free-form hints for form rendering (placeholders, choices, ...)
    prompts: Option<Value>,

    loaded: bool,
    environment: bool,
}

impl Setting {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn new(name: impl Into<String>, kind: SettingKind, default: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            value: default.clone(),
            default,
            label: None,
            description: None,
            prompts: None,
            loaded: false,
            environment: false,
        }
    }

    pub fn bool(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, SettingKind::Bool, Value::Bool(default))
    }

    pub fn int(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, SettingKind::Int, Value::from(default))
    }

    pub fn float(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, SettingKind::Float, Value::from(default))
    }

    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, SettingKind::String, Value::String(default.into()))
    }

    /// Dict setting. `default` should be a JSON object (or `Null` for unset).
    pub fn dict(name: impl Into<String>, default: Value) -> Self {
        Self::new(name, SettingKind::Dict, default)
    }

    pub fn list(name: impl Into<String>, default: Vec<Value>) -> Self {
        Self::new(name, SettingKind::List, Value::Array(default))
    }

    /// Setting whose value is never coerced
    pub fn any(name: impl Into<String>, default: Value) -> Self {
        Self::new(name, SettingKind::Any, default)
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn prompts(mut self, prompts: Value) -> Self {
        self.prompts = Some(prompts);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SettingKind {
        self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn get_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn get_prompts(&self) -> Option<&Value> {
        self.prompts.as_ref()
    }

    /// Whether a real value has been resolved (environment, config or store)
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the value came from the environment and must not be persisted
    pub fn is_environment(&self) -> bool {
        self.environment
    }

    /// Environment variable holding this setting's value
    pub fn env_name(&self) -> String {
        self.name.to_uppercase()
    }

    /// Environment variable holding a path to a file with this setting's value
    pub fn file_env_name(&self) -> String {
        format!("{}_FILE", self.env_name())
    }

    /// One-line summary, e.g. `<Setting session_timeout(int)=10>`
    pub fn summary(&self) -> String {
        format!("<Setting {}({})={}>", self.name, self.kind, self.value)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Replace the value as-is, without coercion.
    ///
    /// Use [`Settings::set_value`](crate::Settings::set_value) to coerce raw
    /// input into the declared kind first.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub(crate) fn mark_loaded(&mut self, value: Value) {
        self.value = value;
        self.loaded = true;
    }

    pub(crate) fn mark_environment(&mut self, value: Value) {
        self.mark_loaded(value);
        self.environment = true;
    }

    /// Put the default back and forget where the old value came from
    pub fn reset(&mut self) {
        self.value = self.default.clone();
        self.loaded = false;
        self.environment = false;
    }

    // =========================================================================
    // Type views
    // =========================================================================

    /// Truthiness of the current value, interpreted by kind.
    ///
    /// - `Bool`: the boolean itself
    /// - `Int`/`Float`: greater than zero
    /// - `Dict`/`List`: non-empty
    /// - anything else: the text form is one of `true`, `t`, `yes`, `y`, `1`
    pub fn is_truthy(&self) -> bool {
        match self.kind {
            SettingKind::Bool => self.value.as_bool().unwrap_or(false),
            kind if kind.is_numeric() => self.value.as_f64().is_some_and(|n| n > 0.0),
            SettingKind::Dict => self.value.as_object().is_some_and(|m| !m.is_empty()),
            SettingKind::List => self.value.as_array().is_some_and(|a| !a.is_empty()),
            _ => convert::is_token(&convert::to_plain_string(&self.value), TRUTHY_TOKENS),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingValue`] if the value has no integer reading.
    pub fn as_int(&self) -> Result<i64> {
        let value = convert::to_int(&self.name, self.value.clone())?;
        value
            .as_i64()
            .ok_or_else(|| Error::invalid(&self.name, "not an integer"))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingValue`] if the value has no float reading.
    pub fn as_float(&self) -> Result<f64> {
        let value = convert::to_float(&self.name, self.value.clone())?;
        value
            .as_f64()
            .ok_or_else(|| Error::invalid(&self.name, "not a float"))
    }

    /// Byte view: UTF-8 for strings, the elements for a list of `0..=255`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for any other value.
    pub fn as_bytes(&self) -> Result<Vec<u8>> {
        match &self.value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| self.mismatch("bytes"))
                })
                .collect(),
            _ => Err(self.mismatch("bytes")),
        }
    }

    /// Number of entries of a `Dict` or `List` setting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for scalar kinds, or when the current
    /// value is not the declared collection.
    pub fn len(&self) -> Result<usize> {
        match (self.kind, &self.value) {
            (SettingKind::Dict, Value::Object(map)) => Ok(map.len()),
            (SettingKind::List, Value::Array(items)) => Ok(items.len()),
            (kind, _) if kind.is_collection() => Err(self.mismatch(kind.as_str())),
            _ => Err(Error::TypeMismatch {
                key: self.name.clone(),
                expected: "dict or list".to_string(),
                actual: self.kind.to_string(),
            }),
        }
    }

    /// # Errors
    ///
    /// Same as [`Setting::len`].
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::TypeMismatch {
            key: self.name.clone(),
            expected: expected.to_string(),
            actual: convert::json_type_name(&self.value).to_string(),
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write the current value to `store`, creating the record if needed.
    ///
    /// Returns `false` without touching the store when the value came from the
    /// environment. Store failures are logged and reported as `false`; the
    /// store is responsible for leaving the previous record intact.
    pub fn save<S: SettingStore + ?Sized>(&self, store: &mut S) -> bool {
        if self.environment {
            debug!(
                "Setting {} was loaded from the environment, not saving",
                self.name
            );
            return false;
        }

        let encoded = convert::encode_for_storage(&self.value);
        debug!(
            "Saving setting {} to the {} store with value: {:?}",
            self.name,
            store.backend_name(),
            encoded
        );

        match store.upsert(&self.name, encoded.as_deref()) {
            Ok(()) => {
                debug!("Setting {} saved", self.name);
                true
            }
            Err(e) => {
                error!("Failed to save setting {}. DETAIL: {e}", self.name);
                false
            }
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&convert::to_plain_string(&self.value))
    }
}

// =============================================================================
// Tests
// =============================================================================
