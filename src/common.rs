//! Small helpers shared across modules.

use serde_json::Value;

/// Follow `path` through nested JSON objects.
///
/// Returns `None` at the first missing key, or when an intermediate value is
/// not an object.
pub fn safe_get<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}
