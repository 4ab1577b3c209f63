//! Raw value coercion
//!
//! Settings arrive as strings (environment variables, mounted files, text
//! columns) or as loosely typed JSON (config files). Each [`SettingKind`] has
//! one coercion function here; [`convert`] dispatches on the kind.
//!
//! `Null` is treated as "unset" and passes through every kind untouched.

use crate::error::{Error, Result};
use crate::setting::SettingKind;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;

/// Tokens that coerce a string to `true` for [`SettingKind::Bool`].
///
/// Compared case-insensitively; any other string coerces to `false`.
pub const BOOL_TRUE_TOKENS: &[&str] = &["true", "1"];

/// Tokens considered truthy when a non-typed setting is tested with
/// [`Setting::is_truthy`](crate::Setting::is_truthy).
pub const TRUTHY_TOKENS: &[&str] = &["true", "t", "yes", "y", "1"];

static LEGACY_LITERALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(True|False|None)\b").expect("static regex"));

/// Coerce `value` into `kind`. `key` is only used for error messages.
///
/// # Errors
///
/// Returns [`Error::InvalidSettingValue`] when the input can't be read as the
/// declared kind and [`Error::TypeMismatch`] when a parsed collection has the
/// wrong shape.
pub fn convert(key: &str, kind: SettingKind, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }

    match kind {
        SettingKind::Bool => to_bool(key, value),
        SettingKind::Int => to_int(key, value),
        SettingKind::Float => to_float(key, value),
        SettingKind::Dict | SettingKind::List => to_collection(key, kind, value),
        SettingKind::String => Ok(Value::String(to_plain_string(&value))),
        SettingKind::Any => Ok(value),
    }
}

/// `true`/`1` (any case) are true, every other string is false.
pub fn to_bool(key: &str, value: Value) -> Result<Value> {
    match value {
        Value::Bool(_) => Ok(value),
        Value::String(s) => Ok(Value::Bool(is_token(&s, BOOL_TRUE_TOKENS))),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        other => Err(Error::invalid(
            key,
            format!("cannot interpret {other} as a boolean"),
        )),
    }
}

/// Integers from numbers (floats are truncated), numeric strings and bools.
pub fn to_int(key: &str, value: Value) -> Result<Value> {
    let int = match &value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                if f.abs() >= i64::MAX as f64 {
                    return Err(Error::invalid(key, format!("{n} is out of range")));
                }
                f.trunc() as i64
            } else {
                return Err(Error::invalid(key, format!("{n} is out of range")));
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| Error::invalid(key, format!("'{s}' is not an integer: {e}")))?,
        Value::Bool(b) => i64::from(*b),
        other => {
            return Err(Error::invalid(
                key,
                format!("cannot interpret {other} as an integer"),
            ));
        }
    };
    Ok(Value::from(int))
}

/// Floats from numbers, numeric strings and bools. Must be finite.
pub fn to_float(key: &str, value: Value) -> Result<Value> {
    let float = match &value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::invalid(key, format!("{n} is not a float")))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| Error::invalid(key, format!("'{s}' is not a float: {e}")))?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        other => {
            return Err(Error::invalid(
                key,
                format!("cannot interpret {other} as a float"),
            ));
        }
    };

    Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| Error::invalid(key, format!("{float} is not a finite number")))
}

/// Objects/arrays from JSON text, falling back to the legacy format.
///
/// Empty strings become an empty collection of the requested kind.
pub fn to_collection(key: &str, kind: SettingKind, value: Value) -> Result<Value> {
    let parsed = match value {
        Value::String(text) if text.trim().is_empty() => {
            return Ok(empty_collection(kind));
        }
        Value::String(text) => parse_json_or_legacy(key, &text)?,
        other => other,
    };

    let shape_ok = match kind {
        SettingKind::Dict => parsed.is_object(),
        SettingKind::List => parsed.is_array(),
        _ => true,
    };
    if !shape_ok {
        return Err(Error::TypeMismatch {
            key: key.to_string(),
            expected: kind.to_string(),
            actual: json_type_name(&parsed).to_string(),
        });
    }
    Ok(parsed)
}

fn parse_json_or_legacy(key: &str, text: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let rewritten = rewrite_legacy(text);
    serde_json::from_str(&rewritten).map_err(|_| {
        Error::invalid(
            key,
            format!("Cannot parse json {rewritten} for variable {key}"),
        )
    })
}

/// Rewrite a Python-repr style literal into JSON.
///
/// Single quotes become double quotes and the bare words `True`, `False`
/// and `None` become `true`, `false` and `null`.
pub fn rewrite_legacy(text: &str) -> String {
    let quoted = text.replace('\'', "\"");
    LEGACY_LITERALS
        .replace_all(&quoted, |caps: &regex::Captures<'_>| match &caps[1] {
            "True" => "true",
            "False" => "false",
            _ => "null",
        })
        .into_owned()
}

fn empty_collection(kind: SettingKind) -> Value {
    match kind {
        SettingKind::List => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

/// Render a value the way it reads to a person: strings without quotes,
/// everything else as compact JSON.
pub fn to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text stored in the value column for `value`. `Null` maps to SQL NULL.
pub fn encode_for_storage(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(to_plain_string(other)),
    }
}

/// Case-insensitive membership test against a token table
pub fn is_token(text: &str, tokens: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    tokens.contains(&lowered.as_str())
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
