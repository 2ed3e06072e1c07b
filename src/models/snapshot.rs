// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted state and the export/import document.

use crate::geometry::GeoPoint;
use crate::models::RunSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything the storage collaborator keeps between sessions.
///
/// Unknown top-level fields (streak counters, drop state, ...) are carried
/// through untouched in `extras`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub revealed: Vec<GeoPoint>,
    #[serde(default)]
    pub runs: Vec<RunSummary>,
    #[serde(default)]
    pub unlocked: BTreeSet<String>,
    #[serde(flatten)]
    pub extras: serde_json::Map<String, serde_json::Value>,
}

/// Portable `{ revealed, runs }` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub revealed: Vec<GeoPoint>,
    pub runs: Vec<RunSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
}

impl ExportDocument {
    /// Validate and decode an import document.
    ///
    /// Both `revealed` and `runs` must be present and be arrays; every entry
    /// must decode. Nothing is partially accepted.
    pub fn parse(json: &str) -> Result<Self, ImportError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ImportError::Json(e.to_string()))?;
        let obj = value.as_object().ok_or(ImportError::NotAnObject)?;

        for field in ["revealed", "runs"] {
            match obj.get(field) {
                Some(v) if v.is_array() => {}
                Some(_) => return Err(ImportError::NotAnArray(field)),
                None => return Err(ImportError::MissingField(field)),
            }
        }

        serde_json::from_value(value).map_err(|e| ImportError::Malformed(e.to_string()))
    }
}

/// Reasons an import document is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("Import document must be a JSON object")]
    NotAnObject,

    #[error("Missing field `{0}`")]
    MissingField(&'static str),

    #[error("Field `{0}` must be an array")]
    NotAnArray(&'static str),

    #[error("Malformed entry: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_keeps_unknown_fields() {
        let json = r#"{"revealed":[],"runs":[],"streak":{"days":4},"dropState":"idle"}"#;
        let snap: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.extras.len(), 2);
        let back = serde_json::to_value(&snap).unwrap();
        assert_eq!(back["streak"]["days"], 4);
    }

    #[test]
    fn test_snapshot_defaults_missing_fields() {
        let snap: Snapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snap, Snapshot::default());
    }

    #[test]
    fn test_parse_rejects_non_arrays() {
        assert!(matches!(
            ExportDocument::parse(r#"{"revealed":{},"runs":[]}"#),
            Err(ImportError::NotAnArray("revealed"))
        ));
        assert!(matches!(
            ExportDocument::parse(r#"{"revealed":[]}"#),
            Err(ImportError::MissingField("runs"))
        ));
        assert!(matches!(ExportDocument::parse("[]"), Err(ImportError::NotAnObject)));
        assert!(matches!(ExportDocument::parse("{"), Err(ImportError::Json(_))));
    }

    #[test]
    fn test_parse_rejects_bad_entries() {
        let doc = r#"{"revealed":[{"lat":"north"}],"runs":[]}"#;
        assert!(matches!(ExportDocument::parse(doc), Err(ImportError::Malformed(_))));
    }
}
