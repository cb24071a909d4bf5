//! # skills-utils
//!
//! Shared plumbing for the skills data pipeline.
//!
//! ## Features
//!
//! - Calendar quarters and date ranges ([`time`])
//! - Lazy fixed-size batching of any iterator ([`iteration`])
//! - Zero-downtime index publishing behind an alias, plus chunked bulk loading ([`index`])
//! - Object storage with in-memory and directory backends, transfers, and a
//!   shared JSON dictionary with optimistic concurrency ([`storage`])
//! - JSON-lines streaming that skips undecodable lines ([`io`])
//! - A common-schema job posting import trait ([`job_posting`])

pub mod cli;
pub mod common;
pub mod error;
pub mod fs;
pub mod hash;
pub mod index;
pub mod io;
pub mod iteration;
pub mod job_posting;
pub mod storage;
pub mod time;

pub mod prelude {
    pub use crate::error::{Result, SkillsError};
    pub use crate::index::{BulkDocument, IndexConfig, IndexPublisher, Indexer, SearchBackend};
    pub use crate::iteration::{Batch, batch};
    pub use crate::storage::ObjectStore;
    pub use crate::time::Quarter;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
