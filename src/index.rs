//! Search index lifecycle: zero-downtime publishing and bulk indexing.
//!
//! # Architecture
//!
//! - **SearchBackend trait**: the operations needed from a search engine
//!   (index create/delete, alias lookup, atomic alias update, bulk write)
//! - **IndexPublisher**: builds a temporary index, then swaps the alias over
//! - **BulkIndexer**: streams documents in chunks and counts acknowledgements
//! - **Indexer trait**: base for indexers that own an alias
//!
//! Backends are constructed by the caller and passed in by reference; nothing
//! in this module holds global connection state.

pub mod backend;
pub mod bulk;
pub mod indexer;
pub mod memory;
pub mod publisher;

pub use backend::{AliasAction, BulkDocument, BulkItemResult, IndexConfig, SearchBackend};
pub use bulk::{BulkConfig, BulkIndexer, BulkStats};
pub use indexer::{DocumentStream, Indexer};
pub use memory::MemorySearchBackend;
pub use publisher::{IndexPublisher, temporary_index_name};
