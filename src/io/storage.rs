//! Key/value persistence for the settings and cached prayer times records.
//!
//! Each record is a JSON document stored under a versioned key. The file backend
//! keeps one `<key>.json` per record and replaces it atomically, so a reader in
//! another process never observes a half-written record.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::common::utils::private_path;

/// Persistent string storage keyed by record name.
pub trait Storage: Send + Sync {
    /// Read a record, `Ok(None)` when it has never been written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace a record.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Records stored as files in a single state directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$XDG_DATA_HOME/prayerboard`, or the custom config directory when one was given.
    pub fn default_dir() -> Result<PathBuf> {
        if let Some(custom) = crate::config::get_custom_config_dir() {
            return Ok(custom);
        }
        let data_dir = dirs::data_dir().context("Could not determine data directory")?;
        Ok(data_dir.join("prayerboard"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing a record.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read record {}", private_path(&path)))
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!(
                "Failed to create state directory {}",
                private_path(&self.dir)
            )
        })?;

        let path = self.record_path(key);
        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)
            .context("Failed to create temporary record file")?;
        temp.write_all(value.as_bytes())
            .context("Failed to write temporary record file")?;
        temp.flush()?;
        temp.persist(&path)
            .with_context(|| format!("Failed to replace record {}", private_path(&path)))?;

        Ok(())
    }
}

/// Process-local storage for tests and one-shot commands.
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        Ok(records.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
