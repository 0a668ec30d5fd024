//! Client-local UI preferences. Nothing here talks to the server.

use std::{collections::HashMap, fs::read_to_string, io, path::PathBuf};

use json::JsonValue;

pub const THEME_KEY: &str = "theme";
pub const DEFAULT_THEME: &str = "coffee";

#[derive(thiserror::Error, Debug)]
pub enum ThemeError {
    #[error("Preference storage unavailable: {0}")]
    Io(#[from] io::Error),
    #[error("Preference file is corrupt: {0}")]
    Corrupt(#[from] json::Error),
}

/// Key-value storage that outlives a single [`ThemeStore`].
pub trait PreferenceStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ThemeError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ThemeError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A single JSON object file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: JsonValue,
}

impl FileStorage {
    /// A missing file is an empty storage.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ThemeError> {
        let path = path.into();
        let values = match read_to_string(&path) {
            Ok(text) => json::parse(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => JsonValue::new_object(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }
}

impl PreferenceStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values[key].as_str().map(|x| x.to_string())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ThemeError> {
        let mut values = self.values.clone();
        values[key] = value.into();
        std::fs::write(&self.path, values.dump())?;
        self.values = values;
        Ok(())
    }
}

/// Owns the current theme and the storage it is persisted to. Construct one
/// per UI tree and hand it down instead of reaching for global state.
pub struct ThemeStore<S: PreferenceStorage> {
    storage: S,
    theme: String,
}

impl<S: PreferenceStorage> ThemeStore<S> {
    pub fn new(storage: S) -> Self {
        let theme = storage.get(THEME_KEY).unwrap_or_else(|| DEFAULT_THEME.to_string());
        Self { storage, theme }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Writes through to storage; the in-memory value only changes once the
    /// write succeeded.
    pub fn set_theme(&mut self, theme: &str) -> Result<(), ThemeError> {
        self.storage.set(THEME_KEY, theme)?;
        self.theme = theme.to_string();
        Ok(())
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_coffee() {
        let store = ThemeStore::new(MemoryStorage::default());
        assert_eq!(store.theme(), "coffee");
    }

    #[test]
    fn set_is_visible_immediately_and_after_reload() {
        let mut store = ThemeStore::new(MemoryStorage::default());
        store.set_theme("forest").unwrap();
        assert_eq!(store.theme(), "forest");

        let reloaded = ThemeStore::new(store.into_storage());
        assert_eq!(reloaded.theme(), "forest");
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = ThemeStore::new(FileStorage::open(&path).unwrap());
        assert_eq!(store.theme(), DEFAULT_THEME);

        let mut store = store;
        store.set_theme("forest").unwrap();
        drop(store);

        let store = ThemeStore::new(FileStorage::open(&path).unwrap());
        assert_eq!(store.theme(), "forest");
    }

    #[test]
    fn failed_write_keeps_previous_theme() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("prefs.json");
        let mut store = ThemeStore::new(FileStorage::open(&path).unwrap());
        assert!(store.set_theme("forest").is_err());
        assert_eq!(store.theme(), "coffee");
    }
}
