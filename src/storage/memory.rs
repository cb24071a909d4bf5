//! In-memory object store for testing and caching.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillsError};
use crate::hash::md5_hex_bytes;
use crate::storage::{ObjectStore, VersionedObject};

/// Configuration for [`MemoryObjectStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryObjectStoreConfig {
    /// Create buckets on first write instead of rejecting the write.
    pub auto_create_buckets: bool,
}

type Bucket = BTreeMap<String, VersionedObject>;

/// An object store that keeps every bucket in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<BTreeMap<String, Bucket>>,
    config: MemoryObjectStoreConfig,
}

impl MemoryObjectStore {
    /// Create a new memory store.
    pub fn new(config: MemoryObjectStoreConfig) -> Self {
        MemoryObjectStore {
            buckets: Mutex::new(BTreeMap::new()),
            config,
        }
    }

    /// Create a store with default configuration.
    pub fn new_default() -> Self {
        Self::new(MemoryObjectStoreConfig::default())
    }

    /// Create an empty bucket. Existing buckets are left as they are.
    pub fn create_bucket(&self, bucket: &str) -> Result<()> {
        if bucket.is_empty() {
            return Err(SkillsError::invalid_argument("bucket name must not be empty"));
        }
        self.buckets.lock().entry(bucket.to_string()).or_default();
        Ok(())
    }

    /// Names of all buckets, sorted.
    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.lock().keys().cloned().collect()
    }

    /// Total number of objects across buckets.
    pub fn object_count(&self) -> usize {
        self.buckets.lock().values().map(BTreeMap::len).sum()
    }

    fn write(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        expected: Option<Option<&str>>,
    ) -> Result<String> {
        if key.is_empty() {
            return Err(SkillsError::invalid_argument("object key must not be empty"));
        }

        let mut buckets = self.buckets.lock();
        if !buckets.contains_key(bucket) {
            if !self.config.auto_create_buckets {
                return Err(SkillsError::not_found(format!("bucket {bucket}")));
            }
            buckets.insert(bucket.to_string(), Bucket::new());
        }
        let Some(objects) = buckets.get_mut(bucket) else {
            return Err(SkillsError::not_found(format!("bucket {bucket}")));
        };

        if let Some(expected) = expected {
            let current = objects.get(key).map(|object| object.etag.as_str());
            if current != expected {
                return Err(SkillsError::conflict(format!(
                    "{bucket}/{key} changed since it was read"
                )));
            }
        }

        let etag = md5_hex_bytes(data);
        objects.insert(
            key.to_string(),
            VersionedObject {
                data: data.to_vec(),
                etag: etag.clone(),
            },
        );
        Ok(etag)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object_versioned(&self, bucket: &str, key: &str) -> Result<Option<VersionedObject>> {
        let buckets = self.buckets.lock();
        match buckets.get(bucket) {
            Some(objects) => Ok(objects.get(key).cloned()),
            // The bucket appears on the first write.
            None if self.config.auto_create_buckets => Ok(None),
            None => Err(SkillsError::not_found(format!("bucket {bucket}"))),
        }
    }

    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<()> {
        self.write(bucket, key, data, None).map(|_| ())
    }

    fn put_object_if(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        expected: Option<&str>,
    ) -> Result<String> {
        self.write(bucket, key, data, Some(expected))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut buckets = self.buckets.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| SkillsError::not_found(format!("bucket {bucket}")))?;
        objects.remove(key);
        Ok(())
    }

    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let buckets = self.buckets.lock();
        let objects = match buckets.get(bucket) {
            Some(objects) => objects,
            None if self.config.auto_create_buckets => return Ok(Vec::new()),
            None => return Err(SkillsError::not_found(format!("bucket {bucket}"))),
        };
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
