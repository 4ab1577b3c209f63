//! In-memory setting store

use super::{SettingRecord, SettingStore};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Setting store kept in process memory (not persisted)
///
/// Useful for tests and for applications that only read settings from the
/// environment.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, SettingRecord>,
    fail_writes: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw text values
    #[must_use]
    pub fn with_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let records = records
            .into_iter()
            .map(|(k, v)| {
                let record = SettingRecord::new(k, Some(v.into()));
                (record.name.clone(), record)
            })
            .collect();
        Self {
            records,
            fail_writes: false,
        }
    }

    /// Make every following write fail, leaving existing records alone
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SettingStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn find(&self, name: &str) -> Result<Option<SettingRecord>> {
        Ok(self.records.get(name).cloned())
    }

    fn all(&self) -> Result<Vec<SettingRecord>> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    fn upsert(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage(format!("write rejected for '{name}'")));
        }
        self.records.insert(
            name.to_string(),
            SettingRecord::new(name, value.map(str::to_string)),
        );
        Ok(())
    }
}
