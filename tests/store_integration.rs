//! Integration tests for the transactional write path

use mnemo::config::EmbeddingConfig;
use mnemo::document::Document;
use mnemo::embedding::{EmbeddingError, EmbeddingGenerator, EmbeddingProvider};
use mnemo::storage::DocumentStore;
use tempfile::TempDir;

fn hash_generator() -> EmbeddingGenerator {
    let config = EmbeddingConfig {
        model: "hash".to_string(),
        cache_dir: None,
    };
    EmbeddingGenerator::from_config(&config).unwrap()
}

#[test]
fn test_admission_filtering_end_to_end() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::open(dir.path().join("mnemo.db"), hash_generator()).unwrap();

    let docs = vec![
        Document::new("test", "This is a valid document with sufficient length."),
        Document::new("test", "Short"),
    ];
    let inserted = store.add_documents(&docs).unwrap();
    assert_eq!(inserted, 1);

    // Only the valid document is retrievable
    let results = store.search_keyword("valid", 5).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].content,
        "This is a valid document with sufficient length."
    );

    let results = store.search_keyword("Short", 5).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_stored_rows_satisfy_invariants() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("mnemo.db");
    let store = DocumentStore::open(&db_path, hash_generator()).unwrap();

    let docs = vec![
        Document::new("slack", "A perfectly reasonable chat message"),
        Document::new("Unknown", "Content from a source we cannot identify"),
        Document::new("github", "   \t  "),
        Document::new("email", "Subject line and body of a short email"),
    ];
    store.add_documents(&docs).unwrap();

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let bad_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM documents WHERE source = 'Unknown' OR length(trim(content)) < 10",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(bad_rows, 0);

    // Exactly one vector entry per document
    let docs_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
        .unwrap();
    let vec_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM vec_documents", [], |row| row.get(0))
        .unwrap();
    assert_eq!(docs_count, 2);
    assert_eq!(vec_count, docs_count);
}

#[test]
fn test_storage_failure_mid_batch_rolls_back_whole_batch() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("mnemo.db");
    let store = DocumentStore::open(&db_path, hash_generator()).unwrap();

    store
        .add_documents(&[Document::new("test", "Document from the first, successful batch")])
        .unwrap();

    // Force a storage-level failure for one specific row, so the batch fails
    // after its first insert succeeded
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER poison_pill BEFORE INSERT ON documents
         WHEN NEW.content LIKE '%poison%'
         BEGIN SELECT RAISE(ABORT, 'forced storage failure'); END;",
    )
    .unwrap();
    drop(conn);

    let failing_batch = vec![
        Document::new("test", "First document of the failing batch"),
        Document::new("test", "Second document carrying the poison marker"),
    ];
    let result = store.add_documents(&failing_batch);
    assert!(result.is_err());

    // Neither document from the failing batch is visible
    assert!(store.search_keyword("failing batch", 5).unwrap().is_empty());
    assert!(store.search_keyword("poison", 5).unwrap().is_empty());

    // The earlier batch is untouched
    let stats = store.stats().unwrap();
    assert_eq!(stats.document_count, 1);
    assert_eq!(stats.vector_count, 1);
}

/// Provider that fails for one marked text, for exercising rollback on
/// embedding-capability failure
struct TrippingProvider;

impl EmbeddingProvider for TrippingProvider {
    fn embed_raw(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.contains("tripwire") {
            return Err(EmbeddingError::GenerationError("model unavailable".to_string()));
        }
        Ok(vec![1.0; 768])
    }

    fn dimension(&self) -> usize {
        768
    }

    fn model_name(&self) -> &str {
        "tripping"
    }
}

#[test]
fn test_embedding_failure_mid_batch_rolls_back_whole_batch() {
    let dir = TempDir::new().unwrap();
    let generator = EmbeddingGenerator::new(Box::new(TrippingProvider));
    let store = DocumentStore::open(dir.path().join("mnemo.db"), generator).unwrap();

    let batch = vec![
        Document::new("test", "A document the model can embed"),
        Document::new("test", "A document that hits the tripwire"),
    ];
    assert!(store.add_documents(&batch).is_err());

    let stats = store.stats().unwrap();
    assert_eq!(stats.document_count, 0);
    assert_eq!(stats.vector_count, 0);
}

#[test]
fn test_second_process_can_read_while_store_open() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("mnemo.db");
    let store = DocumentStore::open(&db_path, hash_generator()).unwrap();

    store
        .add_documents(&[Document::new("test", "Visible to an independent reader")])
        .unwrap();

    // An independent connection (standing in for a second process) reads the
    // committed batch without going through the store
    let reader = rusqlite::Connection::open(&db_path).unwrap();
    let count: i64 = reader
        .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);

    let mode: String = reader
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn test_batches_accumulate_across_calls() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::open(dir.path().join("mnemo.db"), hash_generator()).unwrap();

    store
        .add_documents(&[Document::new("slack", "Message from the first batch of two")])
        .unwrap();
    store
        .add_documents(&[Document::new("github", "Issue from the second batch of two")])
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.document_count, 2);
    assert_eq!(stats.vector_count, 2);
}
