//! Hybrid retrieval: vector similarity with deterministic keyword fallback

mod hybrid;

pub use hybrid::{HybridSearcher, DISTANCE_THRESHOLD};

use crate::document::Metadata;
use serde::Serialize;

/// Which retrieval path produced the returned results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Closest vector match was under the distance threshold
    StrongMatch,
    /// Vector match was weak but a keyword match existed
    Keyword,
    /// Vector match was weak and no keyword match existed; vector results
    /// returned as a last resort
    WeakMatch,
    /// No eligible vector rows at all
    NoResults,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::StrongMatch => "strong_match",
            SearchStrategy::Keyword => "keyword",
            SearchStrategy::WeakMatch => "weak_match",
            SearchStrategy::NoResults => "no_results",
        }
    }
}

/// One search hit. Keyword results carry no distance.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub source: String,
    pub content: String,
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// Search outcome: ordered results plus the strategy that produced them
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub strategy: SearchStrategy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SearchStrategy::StrongMatch).unwrap(),
            "\"strong_match\""
        );
        assert_eq!(SearchStrategy::NoResults.as_str(), "no_results");
    }

    #[test]
    fn test_keyword_result_omits_distance() {
        let result = SearchResult {
            source: "test".to_string(),
            content: "some content".to_string(),
            metadata: Metadata::new(),
            distance: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("distance"));
    }
}
