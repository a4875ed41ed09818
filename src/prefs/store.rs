use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

use crate::db::{live_query, LiveStream};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Snapshot of every stored preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences(BTreeMap<String, PreferenceValue>);

impl Preferences {
    pub fn get(&self, key: &str) -> Option<&PreferenceValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            PreferenceValue::Text(s) => Some(s),
            other => {
                tracing::warn!(key, value = ?other, "Expected a text preference");
                None
            }
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            PreferenceValue::Bool(b) => Some(*b),
            other => {
                tracing::warn!(key, value = ?other, "Expected a boolean preference");
                None
            }
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            PreferenceValue::Float(f) => Some(*f),
            PreferenceValue::Integer(i) => Some(*i as f64),
            other => {
                tracing::warn!(key, value = ?other, "Expected a numeric preference");
                None
            }
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: PreferenceValue) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<PreferenceValue> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Named key-value file, e.g. `catfeina_settings.toml`.
#[derive(Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
    changes: Arc<watch::Sender<u64>>,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
            changes: Arc::new(watch::Sender::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file is an empty set; anything else that
    /// goes wrong is returned.
    pub async fn load(&self) -> Result<Preferences> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&content)?)
    }

    /// Current preferences now and after every write.
    pub fn data(&self) -> LiveStream<Preferences> {
        let store = self.clone();
        live_query(self.changes.subscribe(), move || {
            let store = store.clone();
            async move { store.load().await }
        })
    }

    /// Read-modify-write. Writers are serialised and the file is replaced
    /// atomically.
    pub async fn edit<F>(&self, f: F) -> Result<Preferences>
    where
        F: FnOnce(&mut Preferences),
    {
        let _guard = self.write_lock.lock().await;

        let mut prefs = self.load().await?;
        f(&mut prefs);

        let content = toml::to_string(&prefs).map_err(|e| AppError::Config(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = self.path.with_extension("toml.tmp");
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        self.changes.send_modify(|v| *v = v.wrapping_add(1));
        Ok(prefs)
    }
}
