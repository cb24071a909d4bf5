//! Base trait for indexers that own an alias.
//!
//! Implementors describe the index (alias, settings, mappings) and produce
//! the documents; the provided methods handle index lifecycle and bulk
//! writes.

use serde_json::Value;

use crate::error::Result;
use crate::index::backend::{BulkDocument, IndexConfig, SearchBackend};
use crate::index::bulk::{BulkConfig, BulkIndexer, BulkStats};
use crate::index::publisher::IndexPublisher;

/// A lazy, fallible source of documents.
pub type DocumentStream<'a> = Box<dyn Iterator<Item = Result<BulkDocument>> + 'a>;

pub trait Indexer {
    /// The stable alias readers query.
    fn alias_name(&self) -> &str;

    /// Index settings.
    fn settings(&self) -> Value;

    /// Field mappings.
    fn mappings(&self) -> Value;

    /// Documents to write into `index_name`. A failing item aborts the
    /// write; during [`replace`](Indexer::replace) the new index is dropped.
    fn documents(&self, index_name: &str) -> Result<DocumentStream<'_>>;

    fn bulk_config(&self) -> BulkConfig {
        BulkConfig::default()
    }

    /// Settings and mappings combined into a full index configuration.
    fn index_config(&self) -> IndexConfig {
        IndexConfig::new(self.settings(), self.mappings())
    }

    /// Bulk-write every document into `index_name`.
    fn index_all(&self, backend: &dyn SearchBackend, index_name: &str) -> Result<BulkStats> {
        let documents = self.documents(index_name)?;
        BulkIndexer::with_config(backend, self.bulk_config()).index_all(index_name, documents)
    }

    /// Rebuild the index behind the alias with zero downtime.
    fn replace(&self, backend: &dyn SearchBackend) -> Result<BulkStats> {
        IndexPublisher::new(backend).publish(self.alias_name(), &self.index_config(), |index| {
            self.index_all(backend, index)
        })
    }

    /// Index documents onto the existing index, creating it on first run.
    fn append(&self, backend: &dyn SearchBackend) -> Result<BulkStats> {
        IndexPublisher::new(backend).append(self.alias_name(), &self.index_config(), |index| {
            self.index_all(backend, index)
        })
    }
}
