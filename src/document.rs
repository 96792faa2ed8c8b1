//! Document data model
//!
//! A `Document` is the uniform shape every ingestion source normalizes into.
//! It has no identity until it is stored; the write path assigns a UUID at
//! insert time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata attached to a document (JSON object, source-specific keys)
pub type Metadata = Map<String, Value>;

/// A candidate document handed over by an ingestion source.
///
/// Immutable once constructed. Batches of these are passed wholesale to
/// [`DocumentStore::add_documents`](crate::storage::DocumentStore::add_documents).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_json() {
        let json = r#"{"source": "slack", "content": "deploy finished without errors"}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.source, "slack");
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn test_document_with_metadata() {
        let json = r#"{
            "source": "slack",
            "content": "deploy finished without errors",
            "metadata": {"channel_name": "releases", "user": "U123"}
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(
            doc.metadata.get("channel_name").and_then(Value::as_str),
            Some("releases")
        );
    }
}
