//! The hybrid search strategy
//!
//! Fixed fallback order: strong vector match, then keyword, then weak vector
//! results as a last resort. Keyword results are only ever preferred over
//! vector results when the vector match is weak.

use crate::retrieval::{SearchResponse, SearchResult, SearchStrategy};
use crate::storage::DocumentStore;
use std::collections::HashSet;

/// Distance cutoff separating a strong vector match from a weak one.
///
/// Applies to Euclidean distance over the normalized stored vectors; a design
/// constant, not configurable per call.
pub const DISTANCE_THRESHOLD: f32 = 0.65;

/// Answers queries against a [`DocumentStore`] using the hybrid strategy
pub struct HybridSearcher<'a> {
    store: &'a DocumentStore,
}

impl<'a> HybridSearcher<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Search by meaning, falling back to keyword matching when the closest
    /// vector match is weak.
    ///
    /// Sub-search failures (vector or keyword lookup) degrade to empty result
    /// sets so the strategy still produces a terminal, well-formed answer;
    /// only an embedding failure propagates, since no degraded-embedding
    /// fallback is defined.
    pub fn search(&self, query: &str, limit: usize) -> crate::Result<SearchResponse> {
        let query_vector = self.store.generator().embed(query)?;

        let mut vector_results = match self.store.vector_lookup(&query_vector, limit) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Vector search failed, degrading to empty: {}", e);
                Vec::new()
            }
        };

        // Keep only the first (lowest-distance) occurrence of each exact
        // content string
        let mut seen_content: HashSet<String> = HashSet::new();
        vector_results.retain(|r| seen_content.insert(r.content.clone()));
        vector_results.truncate(limit);

        if vector_results.is_empty() {
            return Ok(SearchResponse {
                results: Vec::new(),
                strategy: SearchStrategy::NoResults,
            });
        }

        let top_distance = vector_results[0].distance.unwrap_or(f32::MAX);
        if top_distance < DISTANCE_THRESHOLD {
            return Ok(SearchResponse {
                results: vector_results,
                strategy: SearchStrategy::StrongMatch,
            });
        }

        tracing::debug!(
            "Top vector distance {:.4} at or above threshold, trying keyword fallback",
            top_distance
        );

        let keyword_results = match self.store.search_keyword(query, limit) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Keyword search failed, degrading to empty: {}", e);
                Vec::new()
            }
        };

        if !keyword_results.is_empty() {
            return Ok(SearchResponse {
                results: keyword_results,
                strategy: SearchStrategy::Keyword,
            });
        }

        Ok(SearchResponse {
            results: vector_results,
            strategy: SearchStrategy::WeakMatch,
        })
    }

    /// Keyword-only search, exposed independently of the hybrid strategy
    pub fn search_keyword(&self, query: &str, limit: usize) -> crate::Result<Vec<SearchResult>> {
        self.store.search_keyword(query, limit)
    }
}
