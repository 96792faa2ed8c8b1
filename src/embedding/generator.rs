//! Matryoshka truncation and normalization on top of a raw provider

use super::provider::{
    EmbeddingError, EmbeddingProvider, FastEmbedProvider, HashEmbeddingProvider,
};
use super::TARGET_DIM;
use crate::config::EmbeddingConfig;

/// Turns text into a fixed-length, L2-normalized vector.
///
/// The raw provider output (768 dimensions for the default model) is cut down
/// to the first [`TARGET_DIM`] components. This relies on the model family
/// being trained so that leading sub-vectors remain individually meaningful
/// for cosine similarity (Matryoshka representation learning); the slice is
/// always the leading prefix, never a sampled subset. The truncated vector is
/// then scaled to unit length so that Euclidean distance over stored vectors
/// is rank-equivalent to cosine similarity.
pub struct EmbeddingGenerator {
    provider: Box<dyn EmbeddingProvider>,
}

impl EmbeddingGenerator {
    pub fn new(provider: Box<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Build the generator the configuration asks for.
    ///
    /// `model = "hash"` selects the offline token-bucket backend; anything
    /// else is handed to FastEmbed, which loads the model once for the
    /// process lifetime.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let provider: Box<dyn EmbeddingProvider> = if config.model == "hash" {
            Box::new(HashEmbeddingProvider::default())
        } else {
            Box::new(FastEmbedProvider::new(
                &config.model,
                config.cache_dir.clone(),
            )?)
        };
        Ok(Self::new(provider))
    }

    /// Embed `text` into exactly [`TARGET_DIM`] components.
    ///
    /// A raw embedding whose norm is exactly zero is returned truncated but
    /// unnormalized; that is a documented edge case, not an error.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let raw = self.provider.embed_raw(text)?;

        if raw.len() < TARGET_DIM {
            return Err(EmbeddingError::DimensionMismatch {
                expected: TARGET_DIM,
                actual: raw.len(),
            });
        }

        let mut truncated = raw[..TARGET_DIM].to_vec();

        let norm = truncated.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm != 0.0 {
            for v in truncated.iter_mut() {
                *v /= norm;
            }
        }

        Ok(truncated)
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }
}
