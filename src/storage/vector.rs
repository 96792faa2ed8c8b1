//! Vector entry persistence and nearest-neighbor lookup
//!
//! Embeddings are stored as little-endian f32 blobs in the `vec_documents`
//! table, keyed by the document rowid. The default index is an exact scan:
//! with normalized vectors, Euclidean distance is rank-equivalent to cosine
//! similarity, and an exact scan preserves the precise ascending-distance
//! ordering the search strategy's threshold depends on.

use crate::embedding::{EmbeddingError, TARGET_DIM};
use crate::error::Result;
use rusqlite::{params, Connection};

/// Nearest-neighbor index over the stored vector entries.
///
/// Injected into the store at construction; implementations must preserve
/// ascending-distance ordering and Euclidean distance semantics. Both
/// operations run against the caller's connection so that an insert lands in
/// the same transaction as its document row.
pub trait VectorIndex: Send + Sync {
    /// Persist one embedding under the document's internal row reference
    fn insert(&self, conn: &Connection, rowid: i64, embedding: &[f32]) -> Result<()>;

    /// Up to `k` entries ordered by ascending distance from `query`
    fn nearest(&self, conn: &Connection, query: &[f32], k: usize) -> Result<Vec<(i64, f32)>>;
}

/// Exact-scan index over the `vec_documents` table
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatVectorIndex;

impl VectorIndex for FlatVectorIndex {
    fn insert(&self, conn: &Connection, rowid: i64, embedding: &[f32]) -> Result<()> {
        if embedding.len() != TARGET_DIM {
            return Err(EmbeddingError::DimensionMismatch {
                expected: TARGET_DIM,
                actual: embedding.len(),
            }
            .into());
        }

        conn.execute(
            "INSERT INTO vec_documents (rowid, embedding) VALUES (?1, ?2)",
            params![rowid, encode_embedding(embedding)],
        )?;
        Ok(())
    }

    fn nearest(&self, conn: &Connection, query: &[f32], k: usize) -> Result<Vec<(i64, f32)>> {
        if query.len() != TARGET_DIM {
            return Err(EmbeddingError::DimensionMismatch {
                expected: TARGET_DIM,
                actual: query.len(),
            }
            .into());
        }

        let mut stmt = conn.prepare("SELECT rowid, embedding FROM vec_documents")?;
        let rows = stmt.query_map([], |row| {
            let rowid: i64 = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((rowid, blob))
        })?;

        let mut scored: Vec<(i64, f32)> = Vec::new();
        for row in rows {
            let (rowid, blob) = row?;
            let embedding = match decode_embedding(&blob) {
                Some(embedding) if embedding.len() == query.len() => embedding,
                _ => {
                    tracing::warn!("Skipping malformed vector entry for rowid {}", rowid);
                    continue;
                }
            };
            scored.push((rowid, l2_distance(query, &embedding)));
        }

        // Ascending distance, rowid as a stable tiebreak
        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }
}

/// Euclidean distance between two equal-length vectors
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for v in embedding {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

fn decode_embedding(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}
