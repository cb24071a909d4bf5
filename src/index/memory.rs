//! In-memory search backend for testing and local pipelines.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::error::{Result, SkillsError};
use crate::index::backend::{AliasAction, BulkDocument, BulkItemResult, IndexConfig, SearchBackend};

#[derive(Debug)]
struct MemoryIndex {
    config: IndexConfig,
    documents: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct BackendState {
    indices: BTreeMap<String, MemoryIndex>,
    /// Alias name to concrete index name.
    aliases: BTreeMap<String, String>,
}

/// A [`SearchBackend`] that keeps indices and aliases in process memory.
///
/// Alias updates are validated as a whole before any of them is applied, so a
/// rejected request leaves every binding untouched.
#[derive(Debug, Default)]
pub struct MemorySearchBackend {
    state: Mutex<BackendState>,
}

impl MemorySearchBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all concrete indices, sorted.
    pub fn indices(&self) -> Vec<String> {
        self.state.lock().indices.keys().cloned().collect()
    }

    /// Number of documents stored in `index`.
    pub fn document_count(&self, index: &str) -> Result<usize> {
        let state = self.state.lock();
        let index = state
            .indices
            .get(index)
            .ok_or_else(|| SkillsError::not_found(format!("index {index}")))?;
        Ok(index.documents.len())
    }

    /// All `(id, source)` pairs stored in `index`, ordered by id.
    pub fn documents(&self, index: &str) -> Result<Vec<(String, Value)>> {
        let state = self.state.lock();
        let index = state
            .indices
            .get(index)
            .ok_or_else(|| SkillsError::not_found(format!("index {index}")))?;
        Ok(index
            .documents
            .iter()
            .map(|(id, source)| (id.clone(), source.clone()))
            .collect())
    }

    /// The configuration `index` was created with.
    pub fn config(&self, index: &str) -> Option<IndexConfig> {
        let state = self.state.lock();
        state.indices.get(index).map(|index| index.config.clone())
    }

    /// A single stored document.
    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        let state = self.state.lock();
        state.indices.get(index)?.documents.get(id).cloned()
    }
}

fn validate_config(name: &str, config: &IndexConfig) -> Result<()> {
    if name.is_empty() {
        return Err(SkillsError::configuration("index name must not be empty"));
    }
    if !config.settings.is_object() {
        return Err(SkillsError::configuration(format!(
            "settings for index {name} must be a JSON object"
        )));
    }
    if !config.mappings.is_object() {
        return Err(SkillsError::configuration(format!(
            "mappings for index {name} must be a JSON object"
        )));
    }
    Ok(())
}

impl SearchBackend for MemorySearchBackend {
    fn create_index(&self, name: &str, config: &IndexConfig) -> Result<()> {
        validate_config(name, config)?;

        let mut state = self.state.lock();
        if state.indices.contains_key(name) {
            return Err(SkillsError::configuration(format!(
                "index {name} already exists"
            )));
        }
        if state.aliases.contains_key(name) {
            return Err(SkillsError::configuration(format!(
                "{name} is already used as an alias"
            )));
        }
        state.indices.insert(
            name.to_string(),
            MemoryIndex {
                config: config.clone(),
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn index_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().indices.contains_key(name))
    }

    fn delete_index(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.indices.remove(name).is_none() {
            return Err(SkillsError::not_found(format!("index {name}")));
        }
        // Aliases die with their index.
        state.aliases.retain(|_, target| target != name);
        Ok(())
    }

    fn alias_exists(&self, alias: &str) -> Result<bool> {
        Ok(self.state.lock().aliases.contains_key(alias))
    }

    fn get_alias_target(&self, alias: &str) -> Result<Option<String>> {
        Ok(self.state.lock().aliases.get(alias).cloned())
    }

    fn update_aliases(&self, actions: &[AliasAction]) -> Result<()> {
        let mut state = self.state.lock();
        let mut aliases = state.aliases.clone();

        for action in actions {
            match action {
                AliasAction::Add { index, alias } => {
                    if !state.indices.contains_key(index) {
                        return Err(SkillsError::backend(format!(
                            "cannot add alias {alias}: index {index} does not exist"
                        )));
                    }
                    if state.indices.contains_key(alias) {
                        return Err(SkillsError::backend(format!(
                            "cannot add alias {alias}: an index with that name exists"
                        )));
                    }
                    aliases.insert(alias.clone(), index.clone());
                }
                AliasAction::Remove { index, alias } => {
                    if aliases.get(alias) != Some(index) {
                        return Err(SkillsError::backend(format!(
                            "cannot remove alias {alias}: not bound to {index}"
                        )));
                    }
                    aliases.remove(alias);
                }
            }
        }

        state.aliases = aliases;
        Ok(())
    }

    fn bulk(&self, index: &str, documents: Vec<BulkDocument>) -> Result<Vec<BulkItemResult>> {
        let mut state = self.state.lock();
        let target = state
            .indices
            .get_mut(index)
            .ok_or_else(|| SkillsError::backend(format!("bulk target {index} does not exist")))?;

        let mut results = Vec::with_capacity(documents.len());
        for document in documents {
            let id = document
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            if !document.source.is_object() {
                results.push(BulkItemResult {
                    ok: false,
                    id,
                    detail: json!({
                        "status": 400,
                        "error": "document source must be a JSON object",
                    }),
                });
                continue;
            }

            let (status, result) = match target.documents.insert(id.clone(), document.source) {
                Some(_) => (200, "updated"),
                None => (201, "created"),
            };
            results.push(BulkItemResult {
                ok: true,
                id,
                detail: json!({"status": status, "result": result}),
            });
        }
        Ok(results)
    }
}
