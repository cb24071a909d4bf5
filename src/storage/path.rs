//! `bucket/prefix` style object paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillsError};

/// A bucket and the key (or key prefix) inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct S3Path {
    pub bucket: String,
    pub key: String,
}

impl S3Path {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        S3Path {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// A child path: `key/name`, or just `name` when the key is empty.
    pub fn join(&self, name: &str) -> S3Path {
        let key = self.key.trim_end_matches('/');
        let key = if key.is_empty() {
            name.to_string()
        } else {
            format!("{key}/{name}")
        };
        S3Path::new(self.bucket.clone(), key)
    }
}

impl fmt::Display for S3Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.key)
        }
    }
}

impl FromStr for S3Path {
    type Err = SkillsError;

    fn from_str(s: &str) -> Result<Self> {
        split_s3_path(s)
    }
}

/// Split `bucket_name/prefix/prefix2` into the bucket and the full prefix.
///
/// Only the first `/` separates; a path without one names a bucket with an
/// empty key. A leading `s3://` scheme is accepted and dropped.
pub fn split_s3_path(path: &str) -> Result<S3Path> {
    let path = path.strip_prefix("s3://").unwrap_or(path);
    let (bucket, key) = path.split_once('/').unwrap_or((path, ""));
    if bucket.is_empty() {
        return Err(SkillsError::invalid_argument(format!(
            "s3 path {path:?} has no bucket"
        )));
    }
    Ok(S3Path::new(bucket, key))
}
