//! Search backend collaborator trait and request types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;

/// Settings and mappings used to create a concrete index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index settings (shards, analyzers, ...).
    #[serde(default = "empty_object")]
    pub settings: Value,

    /// Field mappings.
    #[serde(default = "empty_object")]
    pub mappings: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(settings: Value, mappings: Value) -> Self {
        IndexConfig { settings, mappings }
    }

    /// The request body sent when creating an index.
    pub fn to_body(&self) -> Value {
        json!({
            "settings": self.settings,
            "mappings": self.mappings,
        })
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig::new(empty_object(), empty_object())
    }
}

/// A single step of an alias update.
///
/// Serializes to the search engine's `{"add": {"index": .., "alias": ..}}` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn add(index: impl Into<String>, alias: impl Into<String>) -> Self {
        AliasAction::Add {
            index: index.into(),
            alias: alias.into(),
        }
    }

    pub fn remove(index: impl Into<String>, alias: impl Into<String>) -> Self {
        AliasAction::Remove {
            index: index.into(),
            alias: alias.into(),
        }
    }

    pub fn index(&self) -> &str {
        match self {
            AliasAction::Add { index, .. } | AliasAction::Remove { index, .. } => index,
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            AliasAction::Add { alias, .. } | AliasAction::Remove { alias, .. } => alias,
        }
    }
}

/// Request body for an atomic alias update: `{"actions": [...]}`.
pub fn alias_actions_body(actions: &[AliasAction]) -> Value {
    json!({ "actions": actions })
}

/// A document queued for a bulk write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkDocument {
    /// Caller-assigned id; the backend assigns one when absent.
    pub id: Option<String>,

    /// The document body.
    pub source: Value,
}

impl BulkDocument {
    /// A document whose id is assigned by the backend.
    pub fn new(source: Value) -> Self {
        BulkDocument { id: None, source }
    }

    /// A document with a caller-assigned id.
    pub fn with_id(id: impl Into<String>, source: Value) -> Self {
        BulkDocument {
            id: Some(id.into()),
            source,
        }
    }

    /// Use the string `id` field of the body as the document id, if present.
    pub fn keyed_by_field(source: Value, field: &str) -> Self {
        let id = source.get(field).and_then(Value::as_str).map(str::to_string);
        BulkDocument { id, source }
    }
}

/// Per-document acknowledgement from a bulk write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub ok: bool,
    pub id: String,
    /// Backend response for this item (status, error reason, ...).
    pub detail: Value,
}

/// The operations the publisher and bulk loop need from a search engine.
///
/// Implementations own their connection; callers construct a backend once
/// and pass it in.
pub trait SearchBackend: Send + Sync + fmt::Debug {
    /// Create a concrete index. Invalid settings fail with
    /// [`SkillsError::Configuration`](crate::error::SkillsError::Configuration).
    fn create_index(&self, name: &str, config: &IndexConfig) -> Result<()>;

    /// Check whether a concrete index exists.
    fn index_exists(&self, name: &str) -> Result<bool>;

    /// Delete a concrete index.
    fn delete_index(&self, name: &str) -> Result<()>;

    /// Check whether an alias is bound to any index.
    fn alias_exists(&self, alias: &str) -> Result<bool>;

    /// The index an alias currently resolves to.
    fn get_alias_target(&self, alias: &str) -> Result<Option<String>>;

    /// Apply every action in a single request; either all apply or none do.
    fn update_aliases(&self, actions: &[AliasAction]) -> Result<()>;

    /// Write a chunk of documents, returning one result per document.
    fn bulk(&self, index: &str, documents: Vec<BulkDocument>) -> Result<Vec<BulkItemResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_actions_wire_shape() {
        let actions = vec![
            AliasAction::remove("jobs_old", "jobs"),
            AliasAction::add("jobs_new", "jobs"),
        ];
        assert_eq!(
            alias_actions_body(&actions),
            json!({"actions": [
                {"remove": {"index": "jobs_old", "alias": "jobs"}},
                {"add": {"index": "jobs_new", "alias": "jobs"}}
            ]})
        );
        assert_eq!(actions[0].index(), "jobs_old");
        assert_eq!(actions[1].alias(), "jobs");
    }

    #[test]
    fn test_index_config_body() {
        let config = IndexConfig::new(json!({"number_of_shards": 1}), json!({}));
        assert_eq!(
            config.to_body(),
            json!({"settings": {"number_of_shards": 1}, "mappings": {}})
        );

        let parsed: IndexConfig = serde_json::from_value(json!({"settings": {}})).unwrap();
        assert_eq!(parsed, IndexConfig::default());
    }

    #[test]
    fn test_keyed_by_field() {
        let doc = BulkDocument::keyed_by_field(json!({"id": "NLX_1", "title": "x"}), "id");
        assert_eq!(doc.id.as_deref(), Some("NLX_1"));

        let doc = BulkDocument::keyed_by_field(json!({"title": "x"}), "id");
        assert!(doc.id.is_none());
    }
}
