//! Zero-downtime index publishing.
//!
//! A publish cycle creates a temporary index named after the alias, lets the
//! caller fill it, and then repoints the alias in a single alias update before
//! deleting the index the alias used to resolve to. If filling fails, the
//! temporary index is deleted and the alias is left as it was.
//!
//! ```
//! use serde_json::json;
//! use skills_utils::index::{IndexConfig, IndexPublisher, MemorySearchBackend, SearchBackend};
//!
//! # fn main() -> skills_utils::error::Result<()> {
//! let backend = MemorySearchBackend::new();
//! let publisher = IndexPublisher::new(&backend);
//!
//! let config = IndexConfig::new(json!({"number_of_shards": 1}), json!({}));
//! let index = publisher.publish("jobs", &config, |index| Ok(index.to_string()))?;
//!
//! assert_eq!(backend.get_alias_target("jobs")?, Some(index));
//! # Ok(())
//! # }
//! ```
//!
//! Concurrent publishes against the same alias are not coordinated; callers
//! must keep a single writer per alias.

use log::{error, info, warn};

use crate::error::{Result, SkillsError};
use crate::index::backend::{AliasAction, IndexConfig, SearchBackend};

/// Name for a fresh temporary index behind `alias`.
pub fn temporary_index_name(alias: &str) -> String {
    format!("{alias}_{}", uuid::Uuid::new_v4())
}

/// Deletes its index on drop unless promoted.
///
/// Runs on error returns and on panic unwinding alike.
struct TemporaryIndex<'a> {
    backend: &'a dyn SearchBackend,
    name: String,
    promoted: bool,
}

impl<'a> TemporaryIndex<'a> {
    fn new(backend: &'a dyn SearchBackend, name: String) -> Self {
        TemporaryIndex {
            backend,
            name,
            promoted: false,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn promote(mut self) {
        self.promoted = true;
    }
}

impl Drop for TemporaryIndex<'_> {
    fn drop(&mut self) {
        if self.promoted {
            return;
        }
        info!("deleting temporary index {}", self.name);
        if let Err(e) = self.backend.delete_index(&self.name) {
            warn!("failed to delete temporary index {}: {e}", self.name);
        }
    }
}

/// Publishes indices behind stable aliases.
#[derive(Debug, Clone, Copy)]
pub struct IndexPublisher<'a> {
    backend: &'a dyn SearchBackend,
}

impl<'a> IndexPublisher<'a> {
    /// Create a publisher over an already-connected backend.
    pub fn new(backend: &'a dyn SearchBackend) -> Self {
        IndexPublisher { backend }
    }

    /// The backend this publisher writes to.
    pub fn backend(&self) -> &'a dyn SearchBackend {
        self.backend
    }

    /// Create an index with the given configuration.
    pub fn create_index(&self, name: &str, config: &IndexConfig) -> Result<()> {
        self.backend.create_index(name, config)
    }

    /// The concrete index `alias` resolves to, if the alias exists.
    pub fn get_index_from_alias(&self, alias: &str) -> Result<Option<String>> {
        if !self.backend.alias_exists(alias)? {
            return Ok(None);
        }
        self.backend.get_alias_target(alias)
    }

    /// Point `alias` at `new_index` in one alias update, then delete the
    /// index it previously resolved to.
    ///
    /// Once the alias update succeeds the swap is complete: a failure to
    /// delete the old index is logged and not returned.
    pub fn atomic_swap(&self, alias: &str, new_index: &str) -> Result<()> {
        info!("Performing atomic index alias swap");
        match self.get_index_from_alias(alias)? {
            Some(old_index) => {
                info!("Removing old as well as adding new");
                self.backend.update_aliases(&[
                    AliasAction::remove(old_index.as_str(), alias),
                    AliasAction::add(new_index, alias),
                ])?;
                if old_index != new_index {
                    if let Err(e) = self.backend.delete_index(&old_index) {
                        warn!(
                            "alias {alias} swapped but old index {old_index} was not deleted: {e}"
                        );
                    }
                }
            }
            None => {
                info!("Old alias not found, only adding new");
                self.backend
                    .update_aliases(&[AliasAction::add(new_index, alias)])?;
            }
        }
        Ok(())
    }

    /// Build a fresh index behind `alias`.
    ///
    /// `populate` receives the temporary index name and must write every
    /// document into it. On success the alias is swapped over to the new
    /// index and the old one is deleted. If `populate` fails, the error is
    /// returned as [`SkillsError::Population`] and the alias is untouched.
    pub fn publish<T, F>(&self, alias: &str, config: &IndexConfig, populate: F) -> Result<T>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        let temporary_name = temporary_index_name(alias);
        info!("creating index {temporary_name} with config {}", config.to_body());
        self.create_index(&temporary_name, config)?;
        let temporary = TemporaryIndex::new(self.backend, temporary_name);

        let value = match populate(temporary.name()) {
            Ok(value) => value,
            Err(e) => {
                error!(
                    "deleting temporary index {} due to error: {e}",
                    temporary.name()
                );
                return Err(SkillsError::population(temporary.name(), e));
            }
        };

        self.atomic_swap(alias, temporary.name())?;
        temporary.promote();
        Ok(value)
    }

    /// Add documents to the index behind `alias`.
    ///
    /// Without an existing binding this is a first run and behaves like
    /// [`publish`](Self::publish). Otherwise `populate` writes straight into
    /// the bound index and its errors are returned unchanged.
    pub fn append<T, F>(&self, alias: &str, config: &IndexConfig, populate: F) -> Result<T>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        match self.get_index_from_alias(alias)? {
            Some(target) => {
                info!("appending to index {target} behind alias {alias}");
                populate(&target)
            }
            None => self.publish(alias, config, populate),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use serde_json::json;

    use super::*;
    use crate::index::backend::{BulkDocument, BulkItemResult};
    use crate::index::memory::MemorySearchBackend;

    /// Delegates to a memory backend, failing selected operations.
    #[derive(Debug, Default)]
    struct FlakyBackend {
        inner: MemorySearchBackend,
        fail_delete: bool,
        fail_alias_update: bool,
    }

    impl SearchBackend for FlakyBackend {
        fn create_index(&self, name: &str, config: &IndexConfig) -> Result<()> {
            self.inner.create_index(name, config)
        }

        fn index_exists(&self, name: &str) -> Result<bool> {
            self.inner.index_exists(name)
        }

        fn delete_index(&self, name: &str) -> Result<()> {
            if self.fail_delete {
                return Err(SkillsError::backend("delete refused"));
            }
            self.inner.delete_index(name)
        }

        fn alias_exists(&self, alias: &str) -> Result<bool> {
            self.inner.alias_exists(alias)
        }

        fn get_alias_target(&self, alias: &str) -> Result<Option<String>> {
            self.inner.get_alias_target(alias)
        }

        fn update_aliases(&self, actions: &[AliasAction]) -> Result<()> {
            if self.fail_alias_update {
                return Err(SkillsError::backend("alias update refused"));
            }
            self.inner.update_aliases(actions)
        }

        fn bulk(&self, index: &str, documents: Vec<BulkDocument>) -> Result<Vec<BulkItemResult>> {
            self.inner.bulk(index, documents)
        }
    }

    fn write_one(backend: &MemorySearchBackend, index: &str, title: &str) -> Result<()> {
        backend.bulk(index, vec![BulkDocument::with_id("1", json!({"title": title}))])?;
        Ok(())
    }

    #[test]
    fn test_temporary_index_name() {
        let name = temporary_index_name("jobs");
        assert!(name.starts_with("jobs_"));
        assert_eq!(name.len(), "jobs_".len() + 36);
        assert_ne!(name, temporary_index_name("jobs"));
    }

    #[test]
    fn test_publish_without_prior_binding() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);

        let index = publisher
            .publish("jobs", &IndexConfig::default(), |index| {
                write_one(&backend, index, "nurse")?;
                Ok(index.to_string())
            })
            .unwrap();

        assert_eq!(backend.get_alias_target("jobs").unwrap(), Some(index.clone()));
        assert_eq!(backend.indices(), vec![index.clone()]);
        assert_eq!(
            backend.document(&index, "1"),
            Some(json!({"title": "nurse"}))
        );
    }

    #[test]
    fn test_publish_replaces_existing_binding() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);

        let first = publisher
            .publish("jobs", &IndexConfig::default(), |index| Ok(index.to_string()))
            .unwrap();
        let second = publisher
            .publish("jobs", &IndexConfig::default(), |index| Ok(index.to_string()))
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(publisher.get_index_from_alias("jobs").unwrap(), Some(second.clone()));
        assert!(!backend.index_exists(&first).unwrap());
        assert_eq!(backend.indices(), vec![second]);
    }

    #[test]
    fn test_publish_failure_leaves_alias_untouched() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);
        let original = publisher
            .publish("jobs", &IndexConfig::default(), |index| Ok(index.to_string()))
            .unwrap();

        let mut temporary = String::new();
        let err = publisher
            .publish("jobs", &IndexConfig::default(), |index| -> Result<()> {
                temporary = index.to_string();
                write_one(&backend, index, "half written")?;
                Err(SkillsError::other("source went away"))
            })
            .unwrap_err();

        match err {
            SkillsError::Population { index, source } => {
                assert_eq!(index, temporary);
                assert!(matches!(*source, SkillsError::Other(_)));
            }
            other => panic!("expected population error, got {other:?}"),
        }
        assert_eq!(backend.get_alias_target("jobs").unwrap(), Some(original.clone()));
        assert!(!backend.index_exists(&temporary).unwrap());
        assert_eq!(backend.indices(), vec![original]);
    }

    #[test]
    fn test_publish_failure_without_prior_binding() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);

        let result: Result<()> = publisher.publish("jobs", &IndexConfig::default(), |_| {
            Err(SkillsError::other("boom"))
        });

        assert!(result.is_err());
        assert!(!backend.alias_exists("jobs").unwrap());
        assert!(backend.indices().is_empty());
    }

    #[test]
    fn test_panic_during_populate_deletes_temporary_index() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            publisher.publish("jobs", &IndexConfig::default(), |_| -> Result<()> {
                panic!("interrupted")
            })
        }));

        assert!(outcome.is_err());
        assert!(backend.indices().is_empty());
        assert!(!backend.alias_exists("jobs").unwrap());
    }

    #[test]
    fn test_cleanup_failure_does_not_mask_population_error() {
        let backend = FlakyBackend {
            fail_delete: true,
            ..Default::default()
        };
        let publisher = IndexPublisher::new(&backend);

        let err = publisher
            .publish("jobs", &IndexConfig::default(), |_| -> Result<()> {
                Err(SkillsError::other("source went away"))
            })
            .unwrap_err();

        assert!(matches!(err, SkillsError::Population { .. }));
        // The leaked temporary index is the known gap when deletion fails.
        assert_eq!(backend.inner.indices().len(), 1);
    }

    #[test]
    fn test_failed_swap_deletes_temporary_index() {
        let backend = FlakyBackend {
            fail_alias_update: true,
            ..Default::default()
        };
        let publisher = IndexPublisher::new(&backend);

        let err = publisher
            .publish("jobs", &IndexConfig::default(), |_| Ok(()))
            .unwrap_err();

        assert!(matches!(err, SkillsError::Backend(_)));
        assert!(backend.inner.indices().is_empty());
    }

    #[test]
    fn test_old_index_delete_failure_keeps_new_binding() {
        let backend = FlakyBackend::default();
        backend.inner.create_index("jobs_old", &IndexConfig::default()).unwrap();
        backend
            .inner
            .update_aliases(&[AliasAction::add("jobs_old", "jobs")])
            .unwrap();

        let flaky = FlakyBackend {
            inner: backend.inner,
            fail_delete: true,
            fail_alias_update: false,
        };
        let publisher = IndexPublisher::new(&flaky);
        let new_index = publisher
            .publish("jobs", &IndexConfig::default(), |index| Ok(index.to_string()))
            .unwrap();

        assert_eq!(flaky.get_alias_target("jobs").unwrap(), Some(new_index));
        assert!(flaky.index_exists("jobs_old").unwrap());
    }

    #[test]
    fn test_configuration_error_creates_nothing() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);
        let mut called = false;

        let err = publisher
            .publish("jobs", &IndexConfig::new(json!(42), json!({})), |_| {
                called = true;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, SkillsError::Configuration(_)));
        assert!(!called);
        assert!(backend.indices().is_empty());
    }

    #[test]
    fn test_append_without_binding_publishes() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);

        let index = publisher
            .append("jobs", &IndexConfig::default(), |index| Ok(index.to_string()))
            .unwrap();

        assert!(index.starts_with("jobs_"));
        assert_eq!(backend.get_alias_target("jobs").unwrap(), Some(index));
    }

    #[test]
    fn test_append_writes_into_bound_index() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);
        let bound = publisher
            .publish("jobs", &IndexConfig::default(), |index| Ok(index.to_string()))
            .unwrap();

        let target = publisher
            .append("jobs", &IndexConfig::default(), |index| {
                write_one(&backend, index, "welder")?;
                Ok(index.to_string())
            })
            .unwrap();

        assert_eq!(target, bound);
        assert_eq!(backend.indices(), vec![bound.clone()]);
        assert_eq!(backend.document_count(&bound).unwrap(), 1);
    }

    #[test]
    fn test_append_errors_propagate_unchanged() {
        let backend = MemorySearchBackend::new();
        let publisher = IndexPublisher::new(&backend);
        let bound = publisher
            .publish("jobs", &IndexConfig::default(), |index| Ok(index.to_string()))
            .unwrap();

        let err = publisher
            .append("jobs", &IndexConfig::default(), |_| -> Result<()> {
                Err(SkillsError::other("bad row"))
            })
            .unwrap_err();

        assert!(matches!(err, SkillsError::Other(_)));
        assert!(backend.index_exists(&bound).unwrap());
        assert_eq!(backend.get_alias_target("jobs").unwrap(), Some(bound));
    }
}
