//! Moving files and values between the local filesystem and an object store.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::{Result, SkillsError};
use crate::fs::check_create_folder;
use crate::storage::ObjectStore;
use crate::storage::path::{S3Path, split_s3_path};

/// Bytes written to disk between progress log lines during a download.
const PROGRESS_CHUNK: usize = 1 << 20;

/// Upload a local file under the `s3_path` prefix, keeping its file name.
///
/// `upload(store, "/tmp/out.csv", "bucket/apath")` writes `bucket/apath/out.csv`.
pub fn upload<P: AsRef<Path>>(
    store: &dyn ObjectStore,
    filepath: P,
    s3_path: &str,
) -> Result<S3Path> {
    let filepath = filepath.as_ref();
    let filename = filepath
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            SkillsError::invalid_argument(format!("{} has no file name", filepath.display()))
        })?;

    let destination = split_s3_path(s3_path)?.join(filename);
    info!("uploading from {} to {destination}", filepath.display());
    let data = std::fs::read(filepath)?;
    store.put_object(&destination.bucket, &destination.key, &data)?;
    Ok(destination)
}

/// Write each entry of `data` as `prefix/<key>.json`.
pub fn upload_dict<V: Serialize>(
    store: &dyn ObjectStore,
    s3_prefix: &str,
    data: &BTreeMap<String, V>,
) -> Result<Vec<S3Path>> {
    let prefix = split_s3_path(s3_prefix)?;
    let mut written = Vec::with_capacity(data.len());
    for (key, value) in data {
        let destination = prefix.join(&format!("{key}.json"));
        info!("uploading key {}", destination.key);
        let body = serde_json::to_vec(value)?;
        store.put_object(&destination.bucket, &destination.key, &body)?;
        written.push(destination);
    }
    Ok(written)
}

/// Log how much of a fetched object has been written to disk.
pub fn log_download_progress(num_bytes: usize, obj_size: usize) {
    info!("{num_bytes} bytes written out of {obj_size} total");
}

/// Download the object at `s3_path` into `out_filename`. Returns the byte count.
///
/// The object is fetched in one read; progress is logged while the local
/// file is written.
pub fn download<P: AsRef<Path>>(
    store: &dyn ObjectStore,
    out_filename: P,
    s3_path: &str,
) -> Result<usize> {
    let out_filename = out_filename.as_ref();
    let source = split_s3_path(s3_path)?;
    info!("loading from {source} into {}", out_filename.display());

    let data = store.get_object(&source.bucket, &source.key)?;
    info!("fetched {} bytes from {source}", data.len());
    check_create_folder(out_filename)?;
    let mut writer = BufWriter::new(File::create(out_filename)?);

    let mut transferred = 0;
    for chunk in data.chunks(PROGRESS_CHUNK) {
        writer.write_all(chunk)?;
        transferred += chunk.len();
        log_download_progress(transferred, data.len());
    }
    writer.flush()?;
    Ok(transferred)
}

/// File names (last key segment) of every object under `s3_path`.
pub fn list_files(store: &dyn ObjectStore, s3_path: &str) -> Result<Vec<String>> {
    let prefix = split_s3_path(s3_path)?;
    let keys = store.list_keys(&prefix.bucket, &prefix.key)?;
    Ok(keys
        .iter()
        .filter_map(|key| key.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}
