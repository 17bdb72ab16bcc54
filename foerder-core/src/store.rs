//! Key-value persistence port for preferences and reminders.
//!
//! The scheduler never touches storage directly: it reads and writes whole
//! JSON documents through a `KeyValueStore`. Storage backends (files, browser
//! storage, a database row) are a later layer.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const PREFERENCES_KEY: &str = "notification_preferences";
pub const REMINDERS_KEY: &str = "scheduled_reminders";

pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the whole document stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    docs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.docs.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.docs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.docs.remove(key);
        Ok(())
    }
}

/// Load a document, falling back to `T::default()` when it is missing or corrupt.
///
/// A corrupt document is left in place.
pub fn load_document<T, S>(store: &S, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store
        .read(key)
        .with_context(|| format!("read document {key}"))?
    else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(doc) => Ok(doc),
        Err(e) => {
            tracing::warn!(key, error = %e, "corrupt document, using defaults");
            Ok(T::default())
        }
    }
}

pub fn save_document<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value).with_context(|| format!("serialize {key}"))?;
    store
        .write(key, &json)
        .with_context(|| format!("write document {key}"))
}
