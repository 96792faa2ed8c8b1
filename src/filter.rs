//! Admission filter for candidate documents
//!
//! Gates the write path: documents that are too short or come from an unknown
//! source are excluded from a batch before embedding. A drop is observability,
//! not control flow; it never aborts the batch it came from.

use crate::document::Document;

/// Minimum content length (in characters, after trimming) for admission
pub const MIN_CONTENT_CHARS: usize = 10;

/// Reason a candidate document was excluded from a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Trimmed content is shorter than [`MIN_CONTENT_CHARS`]
    TooShort,
    /// Source field is the placeholder value "Unknown"
    UnknownSource,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::TooShort => write!(f, "too short"),
            DropReason::UnknownSource => write!(f, "unknown source"),
        }
    }
}

/// Decide whether a candidate document is eligible for storage.
///
/// Rules are evaluated in order; the first match wins.
pub fn admit(doc: &Document) -> Result<(), DropReason> {
    if doc.content.trim().chars().count() < MIN_CONTENT_CHARS {
        return Err(DropReason::TooShort);
    }
    if doc.source == "Unknown" {
        return Err(DropReason::UnknownSource);
    }
    Ok(())
}

/// Report a dropped document for operator visibility.
///
/// Includes the channel from metadata when present and a short content
/// preview so the operator can tell what was skipped.
pub fn report_drop(doc: &Document, reason: DropReason) {
    let channel = doc
        .metadata
        .get("channel_name")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown");
    let preview: String = doc.content.trim().chars().take(20).collect();
    tracing::warn!(
        "Dropped document from #{}: '{}...' (reason: {})",
        channel,
        preview,
        reason
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admits_valid_document() {
        let doc = Document::new("slack", "This is a valid document with sufficient length.");
        assert!(admit(&doc).is_ok());
    }

    #[test]
    fn test_drops_short_content() {
        let doc = Document::new("slack", "Short");
        assert_eq!(admit(&doc), Err(DropReason::TooShort));
    }

    #[test]
    fn test_drops_whitespace_padding() {
        // Padding must not rescue content that is too short once trimmed
        let doc = Document::new("slack", "   hi        \n\n");
        assert_eq!(admit(&doc), Err(DropReason::TooShort));
    }

    #[test]
    fn test_drops_empty_content() {
        let doc = Document::new("slack", "");
        assert_eq!(admit(&doc), Err(DropReason::TooShort));
    }

    #[test]
    fn test_drops_unknown_source() {
        let doc = Document::new("Unknown", "This is meaningful content but source is unknown");
        assert_eq!(admit(&doc), Err(DropReason::UnknownSource));
    }

    #[test]
    fn test_too_short_wins_over_unknown_source() {
        // Rules are ordered: a short document from an unknown source reports
        // TooShort, matching rule evaluation order
        let doc = Document::new("Unknown", "hi");
        assert_eq!(admit(&doc), Err(DropReason::TooShort));
    }

    #[test]
    fn test_exactly_ten_chars_admitted() {
        let doc = Document::new("slack", "0123456789");
        assert!(admit(&doc).is_ok());
    }

    #[test]
    fn test_report_drop_does_not_panic_without_channel() {
        let mut doc = Document::new("slack", "x");
        report_drop(&doc, DropReason::TooShort);

        doc.metadata
            .insert("channel_name".to_string(), json!("general"));
        report_drop(&doc, DropReason::TooShort);
    }
}
