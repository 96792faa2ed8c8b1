//! Transactional document and vector storage

mod store;
mod vector;

pub use store::{DocumentStore, StoreStats};
pub use vector::{l2_distance, FlatVectorIndex, VectorIndex};
