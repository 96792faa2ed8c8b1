//! Embedding provider trait and implementations

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Embedding generation failed: {0}")]
    GenerationError(String),

    #[error("Dimension mismatch: expected at least {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for embedding providers
///
/// Abstracts the injected embedding capability (native inference, remote
/// call, or a deterministic stub). Implementations must be deterministic:
/// identical input text yields bit-identical output for a fixed model.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the raw, untruncated embedding for a single text
    fn embed_raw(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Raw output dimension of the underlying model
    fn dimension(&self) -> usize;

    /// Model name for diagnostics
    fn model_name(&self) -> &str;
}

/// FastEmbed provider for local embedding generation
///
/// The model is loaded once at construction and lives for the process
/// lifetime; construction is expensive (first use downloads the model to the
/// local cache), so callers hold one provider per process.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Create a new FastEmbed provider with the specified model.
    ///
    /// Only models whose raw output is wide enough to truncate to the stored
    /// dimension are supported.
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self, EmbeddingError> {
        let embedding_model = match model_name {
            "nomic-embed-text-v1.5" => EmbeddingModel::NomicEmbedTextV15,
            "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
            _ => {
                return Err(EmbeddingError::InitializationError(format!(
                    "Unsupported model: {}. Supported: nomic-embed-text-v1.5, bge-base-en-v1.5",
                    model_name
                )));
            }
        };

        // Both supported models output 768 dimensions
        let dimension = 768;

        tracing::info!(
            "Initializing embedding model: {} ({}D, downloaded on first use if not cached)",
            model_name,
            dimension
        );

        let mut init_options = InitOptions::new(embedding_model).with_show_download_progress(true);
        if let Some(dir) = cache_dir {
            init_options = init_options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(init_options)
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed_raw(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        if embeddings.is_empty() {
            return Err(EmbeddingError::GenerationError(
                "No embeddings generated".to_string(),
            ));
        }

        Ok(embeddings.remove(0))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Deterministic token-bucket embedder.
///
/// Hashes whitespace-separated tokens into a fixed number of buckets and
/// counts occurrences. Far weaker than a trained model, but fully offline and
/// deterministic, which makes it the backend for tests and for environments
/// where the model cache is unavailable.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dims: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self { dims: 768 }
    }
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn embed_raw(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vec = vec![0.0f32; self.dims];
        for token in text.split_whitespace() {
            let mut hash = 5381u64;
            for b in token.to_lowercase().as_bytes() {
                hash = ((hash << 5).wrapping_add(hash)) ^ u64::from(*b);
            }
            let idx = (hash as usize) % self.dims;
            vec[idx] += 1.0;
        }
        Ok(vec)
    }

    fn dimension(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_provider_deterministic() {
        let provider = HashEmbeddingProvider::default();
        let a = provider.embed_raw("quarterly roadmap discussion").unwrap();
        let b = provider.embed_raw("quarterly roadmap discussion").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 768);
    }

    #[test]
    fn test_hash_provider_case_insensitive_tokens() {
        let provider = HashEmbeddingProvider::default();
        let a = provider.embed_raw("Roadmap").unwrap();
        let b = provider.embed_raw("roadmap").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_provider_empty_text_is_zero_vector() {
        let provider = HashEmbeddingProvider::default();
        let vec = provider.embed_raw("").unwrap();
        assert!(vec.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_unsupported_model_rejected() {
        let result = FastEmbedProvider::new("all-MiniLM-L6-v2", None);
        assert!(matches!(
            result,
            Err(EmbeddingError::InitializationError(_))
        ));
    }

    #[test]
    #[ignore] // Requires model download - run with: cargo test -- --ignored
    fn test_fastembed_provider_dimension() {
        let provider = FastEmbedProvider::new("nomic-embed-text-v1.5", None).unwrap();
        assert_eq!(provider.dimension(), 768);

        let raw = provider.embed_raw("This is a test sentence.").unwrap();
        assert_eq!(raw.len(), 768);
    }
}
