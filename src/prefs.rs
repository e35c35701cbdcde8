//! Persistent key/value store for UI preferences.
//!
//! The dashboard persists exactly one thing across restarts: the preferred
//! page size. The store is injected rather than read from ambient global
//! state so the query engine can be tested against an in-memory fake.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::constants::paging;

pub trait PreferenceStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;

    fn set_raw(&self, key: &str, value: &str);

    /// Reads an integer preference, ignoring anything unparsable or not in
    /// the allow-list.
    fn get_u64_validated(&self, key: &str, allowed: &[u64], default: u64) -> u64 {
        self.get_raw(key)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| allowed.contains(v))
            .unwrap_or(default)
    }

    /// The persisted page size, falling back to the default when the stored
    /// value is missing, malformed or off the allow-list.
    fn page_size(&self) -> u64 {
        self.get_u64_validated(
            paging::ITEMS_PER_PAGE_KEY,
            paging::PAGE_SIZE_CHOICES,
            paging::DEFAULT_PAGE_SIZE,
        )
    }
}

/// TOML-file-backed store under the user config directory.
pub struct FilePreferenceStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FilePreferenceStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::load(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Default location: `<config dir>/judolwatch/preferences.toml`.
    #[must_use]
    pub fn open_default() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("judolwatch")
            .join("preferences.toml");
        Self::open(path)
    }

    fn load(path: &Path) -> HashMap<String, String> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return HashMap::new();
        };
        match toml::from_str(&content) {
            Ok(values) => values,
            Err(e) => {
                warn!("Ignoring unreadable preference file {}: {}", path.display(), e);
                HashMap::new()
            }
        }
    }

    fn persist(&self, values: &HashMap<String, String>) {
        let content = match toml::to_string_pretty(values) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to serialize preferences: {}", e);
                return;
            }
        };
        if let Some(parent) = self.path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("Failed to create preference directory: {}", e);
            return;
        }
        // Preference loss is annoying, not fatal.
        if let Err(e) = std::fs::write(&self.path, content) {
            warn!("Failed to write preferences to {}: {}", self.path.display(), e);
        } else {
            debug!("Preferences saved to {}", self.path.display());
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) {
        let Ok(mut values) = self.values.lock() else {
            return;
        };
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
        info!("Preference {} set to {}", key, value);
    }
}

/// In-memory store for tests and one-shot CLI invocations.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_stored_page_size_falls_back_to_default() {
        let store = MemoryPreferenceStore::new();
        store.set_raw(paging::ITEMS_PER_PAGE_KEY, "37");
        assert_eq!(store.page_size(), paging::DEFAULT_PAGE_SIZE);

        store.set_raw(paging::ITEMS_PER_PAGE_KEY, "garbage");
        assert_eq!(store.page_size(), paging::DEFAULT_PAGE_SIZE);

        store.set_raw(paging::ITEMS_PER_PAGE_KEY, "25");
        assert_eq!(store.page_size(), 25);
    }

    #[test]
    fn file_store_round_trips_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");

        let store = FilePreferenceStore::open(&path);
        store.set_raw(paging::ITEMS_PER_PAGE_KEY, "50");

        let reopened = FilePreferenceStore::open(&path);
        assert_eq!(reopened.page_size(), 50);
    }
}
