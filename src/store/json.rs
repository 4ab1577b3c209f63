//! JSON file setting store

use super::{SettingRecord, SettingStore};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Setting store backed by a single JSON file
///
/// The file holds an array of [`SettingRecord`]s sorted by name. Every write
/// goes to a temp file that is renamed over the original, so a failed write
/// leaves the previous content in place.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    pretty: bool,
}

impl JsonStore {
    /// Store at `path` with pretty printed output
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: true,
        }
    }

    /// Store at `path` with compact output
    pub fn compact(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Vec<SettingRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = crate::error::read_file(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| Error::Parse(format!("{}: {e}", self.path.display())))
    }

    /// Atomic write: temp file + rename
    fn write_records(&self, records: &[SettingRecord]) -> Result<()> {
        let content = if self.pretty {
            serde_json::to_string_pretty(records)?
        } else {
            serde_json::to_string(records)?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            crate::security::ensure_secure_dir(parent)?;
        }

        let file_name = self.path.file_name().ok_or_else(|| {
            Error::Config(format!(
                "Invalid path '{}': must have a filename",
                self.path.display()
            ))
        })?;
        let mut temp_filename = file_name.to_os_string();
        temp_filename.push(".tmp");
        let temp_path = self.path.with_file_name(temp_filename);

        crate::error::write_file(&temp_path, &content)?;
        crate::security::set_secure_file_permissions(&temp_path)?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| Error::FileWrite {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl SettingStore for JsonStore {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    fn find(&self, name: &str) -> Result<Option<SettingRecord>> {
        Ok(self.read_records()?.into_iter().find(|r| r.name == name))
    }

    fn all(&self) -> Result<Vec<SettingRecord>> {
        self.read_records()
    }

    fn upsert(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let mut records = self.read_records()?;
        let record = SettingRecord::new(name, value.map(str::to_string));

        match records.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = record,
            None => {
                records.push(record);
                records.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }

        self.write_records(&records)
    }
}
