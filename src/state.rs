use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::consts::TRANSACTION_COUNT_KEY;
use crate::error::{Error, Result};

/// File-backed key-value store standing in for browser local storage.
///
/// Stores items as `KEY=VALUE` lines, sorted by key.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read one item; a missing file or key yields `None`.
    pub fn get_item(&self, key: &str) -> Option<String> {
        self.load_all().remove(key)
    }

    /// Write one item, preserving the others.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.load_all();
        items.insert(key.to_string(), value.to_string());
        self.save_all(&items)
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.load_all();
        if items.remove(key).is_some() {
            self.save_all(&items)?;
        }
        Ok(())
    }

    pub fn load_all(&self) -> BTreeMap<String, String> {
        let mut items = BTreeMap::new();
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return items;
        };
        for line in contents.lines() {
            if let Some((k, v)) = line.split_once('=') {
                items.insert(k.trim().to_string(), v.trim().to_string());
            }
        }
        items
    }

    pub fn save_all(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let content: String = items.iter().map(|(k, v)| format!("{k}={v}\n")).collect();
        fs::write(&self.path, content)
            .map_err(|e| Error::Storage(format!("writing {}: {e}", self.path.display())))
    }

    /// Last cached transaction count. Unparseable values are treated as absent.
    pub fn transaction_count(&self) -> Option<u64> {
        let raw = self.get_item(TRANSACTION_COUNT_KEY)?;
        match raw.parse() {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring malformed cached transaction count");
                None
            }
        }
    }

    pub fn set_transaction_count(&self, count: u64) -> Result<()> {
        self.set_item(TRANSACTION_COUNT_KEY, &count.to_string())
    }
}

#[cfg(test)]
pub(crate) fn temp_storage(name: &str) -> LocalStorage {
    let path = std::env::temp_dir().join(format!("krypt_{}_{}.env", name, std::process::id()));
    let _ = fs::remove_file(&path);
    LocalStorage::new(path)
}
