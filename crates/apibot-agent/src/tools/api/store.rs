//! `ApiStore`: the JSON file that carries user-added API definitions
//! across restarts (`~/.apibot/apis.json` by default).
//!
//! The file holds a JSON array of definitions. Entries that no longer
//! parse are skipped on load but preserved on write.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use super::config::ApiConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a JSON array of API definitions: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub struct ApiStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ApiStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every definition in the file that still parses. A missing file is empty.
    pub fn load(&self) -> Result<Vec<ApiConfig>, StoreError> {
        let entries = self.read_entries()?;
        let configs = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<ApiConfig>(entry) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "skipping unreadable API definition");
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(path = %self.path.display(), count = configs.len(), "loaded API definitions");
        Ok(configs)
    }

    /// Insert `config`, replacing any stored entry with the same name.
    pub fn upsert(&self, config: &ApiConfig) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.read_entries()?;
        let value = serde_json::to_value(config).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        match entries
            .iter_mut()
            .find(|e| e.get("name").and_then(Value::as_str) == Some(config.name.as_str()))
        {
            Some(existing) => *existing = value,
            None => entries.push(value),
        }

        self.write_entries(&entries)
    }

    fn read_entries(&self) -> Result<Vec<Value>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    fn write_entries(&self, entries: &[Value]) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        // Atomic replace.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), count = entries.len(), "saved API definitions");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::api::config::HttpMethod;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ApiStore::new(dir.path().join("apis.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_upsert_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("apis.json");
        let store = ApiStore::new(&path);

        let mut first = ApiConfig::new("ping", "https://e.com/ping", HttpMethod::Get);
        store.upsert(&first).unwrap();
        store
            .upsert(&ApiConfig::new("pong", "https://e.com/pong", HttpMethod::Post))
            .unwrap();

        first.description = "updated".into();
        store.upsert(&first).unwrap();

        let loaded = ApiStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "ping");
        assert_eq!(loaded[0].description, "updated");
        assert_eq!(loaded[1].method, HttpMethod::Post);
    }

    #[test]
    fn test_unparsable_entries_skipped_but_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apis.json");
        std::fs::write(
            &path,
            r#"[{"name":"broken"},{"name":"ok","url":"https://e.com","method":"GET"}]"#,
        )
        .unwrap();

        let store = ApiStore::new(&path);
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "ok");

        store
            .upsert(&ApiConfig::new("new", "https://e.com/n", HttpMethod::Get))
            .unwrap();
        let raw: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn test_not_an_array_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apis.json");
        std::fs::write(&path, r#"{"name":"x"}"#).unwrap();
        assert!(matches!(
            ApiStore::new(&path).load(),
            Err(StoreError::Format { .. })
        ));
    }
}
