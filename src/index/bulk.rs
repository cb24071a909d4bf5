//! Streaming bulk indexing with per-document acknowledgement counting.

use std::ops::AddAssign;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillsError};
use crate::index::backend::{BulkDocument, SearchBackend};
use crate::iteration::Batch;

/// Configuration for bulk writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Documents sent per bulk request.
    pub chunk_size: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        BulkConfig { chunk_size: 500 }
    }
}

/// Success and failure counts of a bulk import.
///
/// Failed documents do not abort an import; callers decide whether a high
/// failure count matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkStats {
    pub ok: u64,
    pub failed: u64,
}

impl BulkStats {
    /// Documents acknowledged either way.
    pub fn total(&self) -> u64 {
        self.ok + self.failed
    }

    /// Whether any document was rejected.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Combine counts from another import.
    pub fn merge(&mut self, other: BulkStats) {
        self.ok += other.ok;
        self.failed += other.failed;
    }
}

impl AddAssign for BulkStats {
    fn add_assign(&mut self, other: BulkStats) {
        self.merge(other);
    }
}

/// Streams documents into an index through the backend's bulk primitive.
#[derive(Debug, Clone)]
pub struct BulkIndexer<'a> {
    backend: &'a dyn SearchBackend,
    config: BulkConfig,
}

impl<'a> BulkIndexer<'a> {
    /// Create a bulk indexer with the default chunk size.
    pub fn new(backend: &'a dyn SearchBackend) -> Self {
        Self::with_config(backend, BulkConfig::default())
    }

    /// Create a bulk indexer with a custom configuration.
    pub fn with_config(backend: &'a dyn SearchBackend, config: BulkConfig) -> Self {
        BulkIndexer { backend, config }
    }

    pub fn config(&self) -> &BulkConfig {
        &self.config
    }

    /// Index every document from `documents` into `index`.
    ///
    /// The source is pulled lazily, one chunk at a time. Per-document
    /// failures are counted; a failed bulk request is returned as an error.
    /// The first `Err` from the source stops the import before its chunk is
    /// sent and is returned as is.
    pub fn index_all<D>(&self, index: &str, documents: D) -> Result<BulkStats>
    where
        D: IntoIterator<Item = Result<BulkDocument>>,
    {
        if self.config.chunk_size == 0 {
            return Err(SkillsError::configuration("bulk chunk size must be positive"));
        }

        let mut stats = BulkStats::default();
        for chunk in Batch::new(documents, self.config.chunk_size)? {
            let chunk = chunk.into_iter().collect::<Result<Vec<_>>>()?;
            let sent = chunk.len();
            let results = self.backend.bulk(index, chunk)?;
            if results.len() != sent {
                return Err(SkillsError::backend(format!(
                    "bulk response for {index} acknowledged {} of {sent} documents",
                    results.len()
                )));
            }
            for result in &results {
                if result.ok {
                    stats.ok += 1;
                } else {
                    stats.failed += 1;
                    debug!("document {} rejected: {}", result.id, result.detail);
                }
            }
        }

        info!("Import results: {} ok, {} not ok", stats.ok, stats.failed);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::index::backend::{AliasAction, BulkItemResult, IndexConfig};
    use crate::index::memory::MemorySearchBackend;

    /// Records chunk sizes before delegating.
    #[derive(Debug, Default)]
    struct RecordingBackend {
        inner: MemorySearchBackend,
        chunks: Mutex<Vec<usize>>,
    }

    impl SearchBackend for RecordingBackend {
        fn create_index(&self, name: &str, config: &IndexConfig) -> Result<()> {
            self.inner.create_index(name, config)
        }

        fn index_exists(&self, name: &str) -> Result<bool> {
            self.inner.index_exists(name)
        }

        fn delete_index(&self, name: &str) -> Result<()> {
            self.inner.delete_index(name)
        }

        fn alias_exists(&self, alias: &str) -> Result<bool> {
            self.inner.alias_exists(alias)
        }

        fn get_alias_target(&self, alias: &str) -> Result<Option<String>> {
            self.inner.get_alias_target(alias)
        }

        fn update_aliases(&self, actions: &[AliasAction]) -> Result<()> {
            self.inner.update_aliases(actions)
        }

        fn bulk(&self, index: &str, documents: Vec<BulkDocument>) -> Result<Vec<BulkItemResult>> {
            self.chunks.lock().push(documents.len());
            self.inner.bulk(index, documents)
        }
    }

    #[test]
    fn test_counts_successes_and_failures() {
        let backend = MemorySearchBackend::new();
        backend.create_index("jobs_a", &IndexConfig::default()).unwrap();

        let documents = (0..10).map(|i| {
            if i % 4 == 0 {
                Ok(BulkDocument::new(json!(i)))
            } else {
                Ok(BulkDocument::with_id(i.to_string(), json!({"n": i})))
            }
        });

        let stats = BulkIndexer::new(&backend)
            .index_all("jobs_a", documents)
            .unwrap();

        assert_eq!(stats, BulkStats { ok: 7, failed: 3 });
        assert_eq!(stats.total(), 10);
        assert!(stats.has_failures());
        assert_eq!(backend.document_count("jobs_a").unwrap(), 7);
    }

    #[test]
    fn test_documents_are_sent_in_chunks() {
        let backend = RecordingBackend::default();
        backend.create_index("jobs_a", &IndexConfig::default()).unwrap();

        let indexer = BulkIndexer::with_config(&backend, BulkConfig { chunk_size: 4 });
        let documents = (0..10).map(|i| Ok(BulkDocument::new(json!({"n": i}))));
        let stats = indexer.index_all("jobs_a", documents).unwrap();

        assert_eq!(stats.ok, 10);
        assert_eq!(*backend.chunks.lock(), vec![4, 4, 2]);
    }

    #[test]
    fn test_source_error_stops_the_import() {
        let backend = RecordingBackend::default();
        backend.create_index("jobs_a", &IndexConfig::default()).unwrap();

        let mut pulled = 0;
        let documents = (0..10).map(|i| {
            pulled += 1;
            if i == 3 {
                Err(SkillsError::parse("line 3 is not a posting"))
            } else {
                Ok(BulkDocument::with_id(i.to_string(), json!({"n": i})))
            }
        });

        let indexer = BulkIndexer::with_config(&backend, BulkConfig { chunk_size: 2 });
        let err = indexer.index_all("jobs_a", documents).unwrap_err();

        assert!(matches!(err, SkillsError::Parse(_)));
        assert_eq!(*backend.chunks.lock(), vec![2]);
        assert_eq!(backend.inner.document_count("jobs_a").unwrap(), 2);
        assert!(pulled < 10);
    }

    #[test]
    fn test_empty_source_sends_nothing() {
        let backend = RecordingBackend::default();
        backend.create_index("jobs_a", &IndexConfig::default()).unwrap();

        let stats = BulkIndexer::new(&backend)
            .index_all("jobs_a", Vec::<Result<BulkDocument>>::new())
            .unwrap();

        assert_eq!(stats, BulkStats::default());
        assert!(backend.chunks.lock().is_empty());
    }

    #[test]
    fn test_transport_error_propagates() {
        let backend = MemorySearchBackend::new();
        let err = BulkIndexer::new(&backend)
            .index_all("missing", vec![Ok(BulkDocument::new(json!({})))])
            .unwrap_err();
        assert!(matches!(err, SkillsError::Backend(_)));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let backend = MemorySearchBackend::new();
        let indexer = BulkIndexer::with_config(&backend, BulkConfig { chunk_size: 0 });
        let err = indexer.index_all("jobs_a", Vec::<Result<BulkDocument>>::new()).unwrap_err();
        assert!(matches!(err, SkillsError::Configuration(_)));
    }

    #[test]
    fn test_stats_merge() {
        let mut stats = BulkStats { ok: 2, failed: 1 };
        stats += BulkStats { ok: 3, failed: 0 };
        assert_eq!(stats, BulkStats { ok: 5, failed: 1 });
    }
}
