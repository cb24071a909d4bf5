//! Directory-backed object store.
//!
//! Each bucket is a sub-directory of the root and each key a file path below
//! it, so `bucket/apath/akey` lives at `<root>/bucket/apath/akey`. Writes go
//! through a staging file and a rename, so readers never see partial objects.
//! Conditional writes are serialized within one process only.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Result, SkillsError};
use crate::hash::md5_hex_bytes;
use crate::storage::{ObjectStore, VersionedObject};

const STAGING_DIR: &str = ".staging";

/// Configuration for [`FileObjectStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObjectStoreConfig {
    /// Directory holding one sub-directory per bucket.
    pub root: PathBuf,

    /// Create bucket directories on first write instead of rejecting the write.
    #[serde(default)]
    pub auto_create_buckets: bool,
}

impl FileObjectStoreConfig {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FileObjectStoreConfig {
            root: root.as_ref().to_path_buf(),
            auto_create_buckets: false,
        }
    }
}

/// An object store rooted at a local directory.
#[derive(Debug)]
pub struct FileObjectStore {
    config: FileObjectStoreConfig,
    write_lock: Mutex<()>,
}

fn storage_error(context: &str, e: std::io::Error) -> SkillsError {
    SkillsError::storage(format!("{context}: {e}"))
}

impl FileObjectStore {
    /// Open a store, creating the root directory if needed.
    pub fn new(config: FileObjectStoreConfig) -> Result<Self> {
        let root = &config.root;
        if !root.exists() {
            fs::create_dir_all(root)
                .map_err(|e| storage_error("Failed to create directory", e))?;
        }
        if !root.is_dir() {
            return Err(SkillsError::storage(format!(
                "Path is not a directory: {}",
                root.display()
            )));
        }

        Ok(FileObjectStore {
            config,
            write_lock: Mutex::new(()),
        })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Create a bucket directory. Existing buckets are left as they are.
    pub fn create_bucket(&self, bucket: &str) -> Result<()> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).map_err(|e| storage_error("Failed to create bucket", e))
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() || bucket.starts_with('.') || bucket.contains(['/', '\\']) {
            return Err(SkillsError::invalid_argument(format!(
                "invalid bucket name: {bucket:?}"
            )));
        }
        Ok(self.config.root.join(bucket))
    }

    fn existing_bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        let dir = self.bucket_dir(bucket)?;
        if !dir.is_dir() {
            return Err(SkillsError::not_found(format!("bucket {bucket}")));
        }
        Ok(dir)
    }

    /// The bucket directory for reads. A missing bucket reads as empty when
    /// buckets are created on demand.
    fn readable_bucket_dir(&self, bucket: &str) -> Result<Option<PathBuf>> {
        match self.existing_bucket_dir(bucket) {
            Ok(dir) => Ok(Some(dir)),
            Err(e) if e.is_not_found() && self.config.auto_create_buckets => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn object_path(&self, bucket_dir: &Path, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && !key.ends_with('/')
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(SkillsError::invalid_argument(format!(
                "invalid object key: {key:?}"
            )));
        }
        Ok(bucket_dir.join(relative))
    }

    fn read(&self, path: &Path) -> Result<Option<VersionedObject>> {
        match fs::read(path) {
            Ok(data) => {
                let etag = md5_hex_bytes(&data);
                Ok(Some(VersionedObject { data, etag }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&format!("Failed to read {}", path.display()), e)),
        }
    }

    fn write(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        expected: Option<Option<&str>>,
    ) -> Result<String> {
        let _guard = self.write_lock.lock();

        let bucket_dir = self.bucket_dir(bucket)?;
        if !bucket_dir.is_dir() {
            if !self.config.auto_create_buckets {
                return Err(SkillsError::not_found(format!("bucket {bucket}")));
            }
            self.create_bucket(bucket)?;
        }
        let path = self.object_path(&bucket_dir, key)?;

        if let Some(expected) = expected {
            let current = self.read(&path)?.map(|object| object.etag);
            if current.as_deref() != expected {
                return Err(SkillsError::conflict(format!(
                    "{bucket}/{key} changed since it was read"
                )));
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| storage_error("Failed to create directory", e))?;
        }

        let staging = self.config.root.join(STAGING_DIR);
        fs::create_dir_all(&staging)
            .map_err(|e| storage_error("Failed to create directory", e))?;
        let staged = staging.join(uuid::Uuid::new_v4().to_string());
        if let Err(e) = fs::write(&staged, data) {
            let _ = fs::remove_file(&staged);
            return Err(storage_error("Failed to write object", e));
        }
        if let Err(e) = fs::rename(&staged, &path) {
            let _ = fs::remove_file(&staged);
            return Err(storage_error("Failed to publish object", e));
        }

        Ok(md5_hex_bytes(data))
    }
}

/// Every object key under `bucket_dir`, sorted.
///
/// Files whose path is not UTF-8 cannot be addressed by a key and are skipped.
fn collect_keys(bucket_dir: &Path) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for entry in WalkDir::new(bucket_dir).min_depth(1) {
        let entry =
            entry.map_err(|e| SkillsError::storage(format!("Failed to list directory: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(bucket_dir).map_err(|e| {
            SkillsError::storage(format!("{} is outside the bucket: {e}", entry.path().display()))
        })?;
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect();
        match segments {
            Some(segments) => keys.push(segments.join("/")),
            None => warn!("Skipping object with a non UTF-8 name: {}", entry.path().display()),
        }
    }
    keys.sort();
    Ok(keys)
}

impl ObjectStore for FileObjectStore {
    fn get_object_versioned(&self, bucket: &str, key: &str) -> Result<Option<VersionedObject>> {
        let Some(bucket_dir) = self.readable_bucket_dir(bucket)? else {
            return Ok(None);
        };
        let path = self.object_path(&bucket_dir, key)?;
        self.read(&path)
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
        let _guard = self.write_lock.lock();
        let bucket_dir = self.existing_bucket_dir(bucket)?;
        let path = self.object_path(&bucket_dir, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("Failed to delete object", e)),
        }
    }

    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let Some(bucket_dir) = self.readable_bucket_dir(bucket)? else {
            return Ok(Vec::new());
        };
        let mut keys = collect_keys(&bucket_dir)?;
        keys.retain(|key| key.starts_with(prefix));
        Ok(keys)
    }
}
