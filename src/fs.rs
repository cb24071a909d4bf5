//! Filesystem helpers: folder creation and a JSON result cache.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Default directory for cached results.
pub const CACHE_DIRECTORY: &str = "tmp/";

/// Create the parent directory of `filename` if it does not exist.
pub fn check_create_folder<P: AsRef<Path>>(filename: P) -> Result<()> {
    if let Some(parent) = filename.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Caches JSON-serializable results as files in a directory.
///
/// ```no_run
/// use skills_utils::fs::JsonCache;
///
/// # fn main() -> skills_utils::error::Result<()> {
/// let cache = JsonCache::default();
/// let titles: Vec<String> = cache.get_or_compute("titles.json", || {
///     Ok(vec!["nurse".to_string(), "welder".to_string()])
/// })?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonCache {
    directory: PathBuf,
}

impl Default for JsonCache {
    fn default() -> Self {
        JsonCache::new(CACHE_DIRECTORY)
    }
}

impl JsonCache {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        JsonCache {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full path of a cache entry.
    pub fn path(&self, filename: &str) -> PathBuf {
        self.directory.join(filename)
    }

    /// Return the cached value for `filename`, or compute, store and return it.
    pub fn get_or_compute<T, F>(&self, filename: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let path = self.path(filename);
        check_create_folder(&path)?;

        match File::open(&path) {
            Ok(file) => {
                debug!("cache hit for {}", path.display());
                return Ok(serde_json::from_reader(BufReader::new(file))?);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let value = compute()?;
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, &value)?;
        writer.flush()?;
        Ok(value)
    }

    /// Drop a cache entry. Missing entries are ignored.
    pub fn invalidate(&self, filename: &str) -> Result<()> {
        match fs::remove_file(self.path(filename)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
