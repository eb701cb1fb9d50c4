//! Portable document format for a subject collection.
//!
//! The same shape is used for the persisted snapshot and for export files:
//! a JSON array of `{ id, title, hours, checks }` records, where `hours` is
//! the cycle count and `checks` the per-cycle marks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use study_core::Subject;
use thiserror::Error;

/// Reasons a document cannot be read as a subject collection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid format: expected an array of subjects")]
    NotASequence,
}

/// Persisted shape for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: String,
    pub title: String,
    pub hours: usize,
    pub checks: Vec<bool>,
}

impl SubjectRecord {
    #[must_use]
    pub fn from_subject(subject: &Subject) -> Self {
        Self {
            id: subject.id().to_string(),
            title: subject.title().to_owned(),
            hours: subject.total_cycles(),
            checks: subject.marks().to_vec(),
        }
    }
}

fn records(subjects: &[Subject]) -> Vec<SubjectRecord> {
    subjects.iter().map(SubjectRecord::from_subject).collect()
}

/// Single-line encoding, used for the persisted snapshot.
#[must_use]
pub fn encode_compact(subjects: &[Subject]) -> String {
    // a Vec of plain records cannot fail to serialize
    serde_json::to_string(&records(subjects)).unwrap_or_else(|_| "[]".to_owned())
}

/// Two-space indented encoding, used for export files.
#[must_use]
pub fn encode_pretty(subjects: &[Subject]) -> String {
    serde_json::to_string_pretty(&records(subjects)).unwrap_or_else(|_| "[]".to_owned())
}

/// Parses `text` and returns the raw elements of its top-level array.
///
/// Elements are left untyped; callers run each through the normalizer.
///
/// # Errors
///
/// Returns `DocumentError::Malformed` if `text` is not JSON and
/// `DocumentError::NotASequence` if the top level is not an array.
pub fn decode_elements(text: &str) -> Result<Vec<Value>, DocumentError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => Ok(items),
        _ => Err(DocumentError::NotASequence),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use study_core::{SubjectDraft, normalize};

    use super::*;

    fn sample() -> Subject {
        normalize(
            SubjectDraft::new("Math", 3)
                .with_id("m-1")
                .with_marks(vec![true, false, true]),
        )
        .subject
    }

    #[test]
    fn compact_uses_wire_field_names() {
        let text = encode_compact(&[sample()]);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!([{ "id": "m-1", "title": "Math", "hours": 3, "checks": [true, false, true] }])
        );
        assert!(!text.contains('\n'));
    }

    #[test]
    fn pretty_is_indented() {
        let text = encode_pretty(&[sample()]);
        assert!(text.starts_with("[\n  {\n    \"id\": \"m-1\""));
    }

    #[test]
    fn empty_collection_encodes_as_empty_array() {
        assert_eq!(encode_compact(&[]), "[]");
        assert!(decode_elements("[]").unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_non_array_top_level() {
        let err = decode_elements(r#"{"title":"X"}"#).unwrap_err();
        assert!(matches!(err, DocumentError::NotASequence));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = decode_elements("not json").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn decode_keeps_elements_untyped() {
        let items = decode_elements(r#"[{"title":"X","hours":400,"checks":[]}, 5]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], json!(5));
    }
}
