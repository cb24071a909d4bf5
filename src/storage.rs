//! Object storage abstraction and S3-style helpers.
//!
//! This module exposes a pluggable object store facade. Memory and file
//! backends can be swapped without touching higher-level code such as the
//! transfer helpers or [`JsonDict`](json_dict::JsonDict).
//!
//! # Architecture
//!
//! - **ObjectStore trait**: bucket/key byte storage with entity tags
//! - **ObjectStoreConfig enum**: type-safe configuration for supported backends
//! - **ObjectStoreFactory**: helper for constructing concrete stores
//!
//! # Example
//!
//! ```
//! use skills_utils::storage::{ObjectStoreConfig, ObjectStoreFactory};
//! use skills_utils::storage::memory::MemoryObjectStoreConfig;
//!
//! # fn main() -> skills_utils::error::Result<()> {
//! let mut config = MemoryObjectStoreConfig::default();
//! config.auto_create_buckets = true;
//! let store = ObjectStoreFactory::create(ObjectStoreConfig::Memory(config))?;
//!
//! store.put_object("test-bucket", "apath/akey", b"test")?;
//! assert_eq!(store.get_object("test-bucket", "apath/akey")?, b"test");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillsError};

pub mod file;
pub mod json_dict;
pub mod memory;
pub mod path;
pub mod transfer;

pub use path::{S3Path, split_s3_path};

/// Object contents together with their entity tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedObject {
    pub data: Vec<u8>,

    /// MD5 of `data` as lowercase hex.
    pub etag: String,
}

/// A trait for bucket/key object stores.
///
/// Conditional writes through [`put_object_if`](ObjectStore::put_object_if)
/// give callers an optimistic-concurrency token for read-modify-write cycles.
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Read an object with its entity tag, `None` when the key does not exist.
    fn get_object_versioned(&self, bucket: &str, key: &str) -> Result<Option<VersionedObject>>;

    /// Write an object unconditionally.
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<()>;

    /// Write an object only if its current entity tag equals `expected`.
    ///
    /// `expected == None` requires the key to be absent. A mismatch fails with
    /// [`SkillsError::Conflict`]. Returns the new entity tag.
    fn put_object_if(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        expected: Option<&str>,
    ) -> Result<String>;

    /// Remove an object. Removing a missing key is not an error.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// All keys in `bucket` starting with `prefix`, sorted.
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Read an object's bytes.
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.get_object_versioned(bucket, key)?
            .map(|object| object.data)
            .ok_or_else(|| SkillsError::not_found(format!("{bucket}/{key}")))
    }

    /// Check whether an object exists.
    fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.get_object_versioned(bucket, key)?.is_some())
    }
}

/// Storage configuration enum that holds backend-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectStoreConfig {
    /// Directory-backed store (one sub-directory per bucket)
    File(file::FileObjectStoreConfig),

    /// Memory-backed store
    Memory(memory::MemoryObjectStoreConfig),
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        ObjectStoreConfig::Memory(memory::MemoryObjectStoreConfig::default())
    }
}

/// A factory for creating object stores from configuration.
pub struct ObjectStoreFactory;

impl ObjectStoreFactory {
    /// Create a new object store with the given configuration.
    pub fn create(config: ObjectStoreConfig) -> Result<Arc<dyn ObjectStore>> {
        match config {
            ObjectStoreConfig::Memory(mem_config) => {
                Ok(Arc::new(memory::MemoryObjectStore::new(mem_config)))
            }
            ObjectStoreConfig::File(file_config) => {
                Ok(Arc::new(file::FileObjectStore::new(file_config)?))
            }
        }
    }
}
