//! Importing partner job postings into the common schema
//! (<http://schema.org/JobPosting>).
//!
//! A partner importer knows how to list its raw postings for a quarter, how
//! to identify each one, and how to transform it. [`JobPostingImporter::postings`]
//! strings those together and stamps every posting with a partner-scoped id.

use log::info;
use serde_json::{Map, Value};

use crate::error::{Result, SkillsError};
use crate::index::BulkDocument;
use crate::time::Quarter;

/// Fields every common-schema posting carries.
pub const MANDATORY_FIELDS: [&str; 5] = [
    "title",
    "description",
    "datePosted",
    "validThrough",
    "jobLocation",
];

pub const SCHEMA_CONTEXT: &str = "http://schema.org";
pub const SCHEMA_TYPE: &str = "JobPosting";

/// Extracts job postings from one partner and transforms them into the
/// common schema.
pub trait JobPostingImporter {
    /// A posting in the partner's own format.
    type Raw;

    /// Short identifier for the partner, e.g. `NLX` or `VA`.
    fn partner_id(&self) -> &str;

    /// Every raw posting relevant to `quarter`.
    fn iter_postings(
        &self,
        quarter: &Quarter,
    ) -> Result<Box<dyn Iterator<Item = Result<Self::Raw>> + '_>>;

    /// Partner-specific id of a raw posting.
    fn posting_id(&self, raw: &Self::Raw) -> String;

    /// Transform a raw posting into the common schema.
    fn transform(&self, raw: &Self::Raw) -> Result<Map<String, Value>>;

    /// Transformed postings for `quarter`, each with `id` set to
    /// `{partner_id}_{posting_id}`.
    fn postings(&self, quarter: &Quarter) -> Result<Box<dyn Iterator<Item = Result<Value>> + '_>> {
        info!("Finding postings for {quarter}");
        let raw_postings = self.iter_postings(quarter)?;
        Ok(Box::new(raw_postings.map(move |raw| {
            let raw = raw?;
            let mut transformed = self.transform(&raw)?;
            let id = format!("{}_{}", self.partner_id(), self.posting_id(&raw));
            transformed.insert("id".to_string(), Value::String(id));
            Ok(Value::Object(transformed))
        })))
    }
}

/// Check the basic shape of a common-schema posting.
pub fn validate_common_schema(posting: &Value) -> Result<()> {
    let object = posting
        .as_object()
        .ok_or_else(|| SkillsError::invalid_argument("job posting must be a JSON object"))?;

    if object.get("@context").and_then(Value::as_str) != Some(SCHEMA_CONTEXT) {
        return Err(SkillsError::invalid_argument(format!(
            "job posting @context must be {SCHEMA_CONTEXT}"
        )));
    }
    if object.get("@type").and_then(Value::as_str) != Some(SCHEMA_TYPE) {
        return Err(SkillsError::invalid_argument(format!(
            "job posting @type must be {SCHEMA_TYPE}"
        )));
    }

    let missing: Vec<&str> = MANDATORY_FIELDS
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(SkillsError::invalid_argument(format!(
            "job posting is missing fields: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Turn transformed postings into bulk documents keyed by their `id`.
pub fn postings_to_documents<I>(postings: I) -> impl Iterator<Item = Result<BulkDocument>>
where
    I: IntoIterator<Item = Result<Value>>,
{
    postings
        .into_iter()
        .map(|posting| Ok(BulkDocument::keyed_by_field(posting?, "id")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct SampleImporter {
        raw: Vec<Value>,
    }

    impl JobPostingImporter for SampleImporter {
        type Raw = Value;

        fn partner_id(&self) -> &str {
            "xx"
        }

        fn iter_postings(
            &self,
            _quarter: &Quarter,
        ) -> Result<Box<dyn Iterator<Item = Result<Value>> + '_>> {
            Ok(Box::new(self.raw.iter().cloned().map(Ok)))
        }

        fn posting_id(&self, raw: &Value) -> String {
            raw["job_id"].as_u64().unwrap_or_default().to_string()
        }

        fn transform(&self, raw: &Value) -> Result<Map<String, Value>> {
            let mut transformed: Map<String, Value> = MANDATORY_FIELDS
                .iter()
                .map(|field| (field.to_string(), json!("")))
                .collect();
            transformed.insert("@context".to_string(), json!(SCHEMA_CONTEXT));
            transformed.insert("@type".to_string(), json!(SCHEMA_TYPE));
            if let Some(title) = raw.get("name") {
                transformed.insert("title".to_string(), title.clone());
            }
            Ok(transformed)
        }
    }

    fn quarter() -> Quarter {
        "2015Q1".parse().unwrap()
    }

    #[test]
    fn test_schema_org() {
        let importer = SampleImporter { raw: vec![] };
        let transformed = Value::Object(importer.transform(&json!({})).unwrap());

        assert_eq!(transformed["@context"], SCHEMA_CONTEXT);
        assert_eq!(transformed["@type"], SCHEMA_TYPE);
        validate_common_schema(&transformed).unwrap();
    }

    #[test]
    fn test_postings_stamp_partner_id() {
        let importer = SampleImporter {
            raw: vec![json!({"job_id": 7, "name": "nurse"}), json!({"job_id": 9})],
        };

        let postings: Vec<Value> = importer
            .postings(&quarter())
            .unwrap()
            .map(|p| p.unwrap())
            .collect();

        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0]["id"], "xx_7");
        assert_eq!(postings[0]["title"], "nurse");
        assert_eq!(postings[1]["id"], "xx_9");
    }

    #[test]
    fn test_validate_common_schema_rejects() {
        assert!(validate_common_schema(&json!([1])).is_err());
        let wrong_type = json!({"@context": SCHEMA_CONTEXT, "@type": "Other"});
        assert!(validate_common_schema(&wrong_type).is_err());

        let err = validate_common_schema(&json!({
            "@context": SCHEMA_CONTEXT,
            "@type": SCHEMA_TYPE,
            "title": "",
        }))
        .unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn test_postings_to_documents() {
        let importer = SampleImporter {
            raw: vec![json!({"job_id": 1})],
        };
        let postings = importer.postings(&quarter()).unwrap();
        let documents: Vec<BulkDocument> = postings_to_documents(postings)
            .map(|d| d.unwrap())
            .collect();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id.as_deref(), Some("xx_1"));
    }
}
