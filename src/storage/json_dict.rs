//! A JSON object persisted in an object store.
//!
//! [`JsonDict`] keeps a `serde_json` map in memory and writes it to
//! `<path>.json`. Saving merges the stored object with local changes (local
//! values win) and writes back conditionally on the entity tag read during
//! the merge; a concurrent writer forces a re-read and re-merge instead of
//! being overwritten.

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SkillsError};
use crate::storage::ObjectStore;
use crate::storage::path::{S3Path, split_s3_path};

/// Configuration for [`JsonDict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonDictConfig {
    /// Save automatically after this many inserts. Zero disables auto-save.
    pub save_every_n_updates: u64,

    /// Merge-and-write attempts before a save gives up with a conflict.
    pub max_save_attempts: usize,
}

impl Default for JsonDictConfig {
    fn default() -> Self {
        JsonDictConfig {
            save_every_n_updates: 1000,
            max_save_attempts: 3,
        }
    }
}

/// A JSON-serializable map backed by an object store.
///
/// Changes are only durable after [`save`](JsonDict::save), either explicit
/// or through auto-save.
#[derive(Debug)]
pub struct JsonDict {
    store: Arc<dyn ObjectStore>,
    location: S3Path,
    storage: Map<String, Value>,
    removed: BTreeSet<String>,
    num_updates: u64,
    config: JsonDictConfig,
}

fn parse_object(data: &[u8], location: &S3Path) -> Result<Map<String, Value>> {
    let text = std::str::from_utf8(data)
        .map_err(|e| SkillsError::parse(format!("{location} is not UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(SkillsError::parse(format!("{location} does not hold a JSON object"))),
    }
}

impl JsonDict {
    /// Load the dictionary stored at `path` (bucket and key, without `.json`).
    pub fn open(store: Arc<dyn ObjectStore>, path: &str, config: JsonDictConfig) -> Result<Self> {
        let location = split_s3_path(&format!("{path}.json"))?;
        let storage = match store.get_object_versioned(&location.bucket, &location.key)? {
            Some(object) => parse_object(&object.data, &location)?,
            None => Map::new(),
        };
        info!("Loaded storage with {} keys", storage.len());

        Ok(JsonDict {
            store,
            location,
            storage,
            removed: BTreeSet::new(),
            num_updates: 0,
            config,
        })
    }

    /// Where the dictionary is saved.
    pub fn location(&self) -> &S3Path {
        &self.location
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.storage.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.storage.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.storage.iter()
    }

    pub fn keys(&self) -> serde_json::map::Keys<'_> {
        self.storage.keys()
    }

    /// Inserts counted so far; drives auto-save.
    pub fn num_updates(&self) -> u64 {
        self.num_updates
    }

    /// Insert a value, saving when the update count reaches the auto-save interval.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        let key = key.into();
        self.removed.remove(&key);
        let previous = self.storage.insert(key, value.into());

        self.num_updates += 1;
        let every = self.config.save_every_n_updates;
        if every > 0 && self.num_updates % every == 0 {
            info!("Auto-saving after {} updates", self.num_updates);
            self.save()?;
        }
        Ok(previous)
    }

    /// Remove a key. The removal also applies to the stored copy on the next save.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let previous = self.storage.remove(key);
        self.removed.insert(key.to_string());
        previous
    }

    /// Merge with the stored object and write the result.
    pub fn save(&mut self) -> Result<()> {
        let bucket = self.location.bucket.clone();
        let key = self.location.key.clone();
        info!(
            "Attempting to save storage of length {} to {}",
            self.len(),
            self.location
        );

        let attempts = self.config.max_save_attempts.max(1);
        for attempt in 1..=attempts {
            let (mut merged, etag) = match self.store.get_object_versioned(&bucket, &key)? {
                Some(object) => (parse_object(&object.data, &self.location)?, Some(object.etag)),
                None => (Map::new(), None),
            };
            info!(
                "Merging {} in-memory keys with {} stored keys. In-memory data takes priority",
                self.len(),
                merged.len()
            );
            for removed in &self.removed {
                merged.remove(removed);
            }
            for (k, v) in &self.storage {
                merged.insert(k.clone(), v.clone());
            }

            let body = serde_json::to_vec(&merged)?;
            match self.store.put_object_if(&bucket, &key, &body, etag.as_deref()) {
                Ok(_) => {
                    self.storage = merged;
                    self.removed.clear();
                    return Ok(());
                }
                Err(SkillsError::Conflict(msg)) => {
                    warn!("save attempt {attempt} of {attempts} lost a race: {msg}");
                }
                Err(e) => return Err(e),
            }
        }

        Err(SkillsError::conflict(format!(
            "{} kept changing; gave up after {attempts} attempts",
            self.location
        )))
    }
}
