//! Embedding generation
//!
//! An injected [`EmbeddingProvider`] turns text into a raw model-specific
//! vector; the [`EmbeddingGenerator`] truncates it to [`TARGET_DIM`]
//! components (Matryoshka) and L2-normalizes the result.

mod generator;
mod provider;

pub use generator::EmbeddingGenerator;
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider, HashEmbeddingProvider};

/// Stored embedding dimension. Raw model output is truncated to this many
/// leading components; a design constant, not a tunable.
pub const TARGET_DIM: usize = 512;
