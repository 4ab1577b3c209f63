//! Persistent storage for setting values
//!
//! A store holds one [`SettingRecord`] per setting name with the value kept
//! as text. [`Setting::save`](crate::Setting::save) writes through
//! [`SettingStore::upsert`] and [`Settings::load_database`](crate::Settings::load_database)
//! reads everything back with [`SettingStore::all`].
//!
//! Implementations must leave the previous record untouched when an upsert
//! fails.

mod json;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use json::JsonStore;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One persisted setting row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRecord {
    pub name: String,

    /// Stored text; `None` is an explicit NULL
    pub value: Option<String>,

    /// Time of the last write
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl SettingRecord {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            updated_at: Some(OffsetDateTime::now_utc()),
        }
    }
}

/// Trait for setting store implementations
pub trait SettingStore {
    /// Short name used in log messages (e.g. "memory", "sqlite")
    fn backend_name(&self) -> &'static str;

    /// Fetch the record for `name`, if any
    fn find(&self, name: &str) -> Result<Option<SettingRecord>>;

    /// Every stored record
    fn all(&self) -> Result<Vec<SettingRecord>>;

    /// Insert or replace the value for `name`
    fn upsert(&mut self, name: &str, value: Option<&str>) -> Result<()>;
}

impl<T: SettingStore + ?Sized> SettingStore for Box<T> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn find(&self, name: &str) -> Result<Option<SettingRecord>> {
        (**self).find(name)
    }

    fn all(&self) -> Result<Vec<SettingRecord>> {
        (**self).all()
    }

    fn upsert(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        (**self).upsert(name, value)
    }
}
