//! Durable document + vector storage over SQLite
//!
//! One local store file holds the document table and its parallel vector
//! entries. Writes are batch-transactional: everything in one
//! `add_documents` call commits together or nothing does. Cross-process
//! concurrency is delegated entirely to SQLite (WAL for concurrent readers,
//! a bounded busy timeout for contending writers); there are no in-process
//! locks.

use crate::config::Config;
use crate::document::Document;
use crate::embedding::EmbeddingGenerator;
use crate::error::{MnemoError, Result};
use crate::filter::{admit, report_drop};
use crate::retrieval::SearchResult;
use crate::storage::vector::{FlatVectorIndex, VectorIndex};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use uuid::Uuid;

/// How long a writer waits on a locked store before failing (design
/// constant, not a per-call tunable)
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Read-time defense applied to every row a search may return, mirroring the
/// write-time admission rules
const READ_FILTER: &str = "content IS NOT NULL AND length(content) > 10 AND source != 'Unknown'";

/// Document store with a parallel vector index.
///
/// Owns the embedding generator (the underlying model is initialized once at
/// construction and lives for the process lifetime) and the injected
/// [`VectorIndex`]. Every operation opens its own scoped connection and
/// releases it on every exit path.
pub struct DocumentStore {
    db_path: PathBuf,
    generator: EmbeddingGenerator,
    index: Box<dyn VectorIndex>,
}

impl DocumentStore {
    /// Open (creating if needed) the store at `db_path` with the default
    /// exact-scan vector index
    pub fn open(db_path: impl Into<PathBuf>, generator: EmbeddingGenerator) -> Result<Self> {
        Self::with_index(db_path, generator, Box::new(FlatVectorIndex))
    }

    /// Open the store with a custom vector index
    pub fn with_index(
        db_path: impl Into<PathBuf>,
        generator: EmbeddingGenerator,
        index: Box<dyn VectorIndex>,
    ) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MnemoError::Io {
                source: e,
                context: format!("Failed to create store directory: {:?}", parent),
            })?;
        }

        let store = Self {
            db_path,
            generator,
            index,
        };
        store.migrate()?;

        tracing::info!("Initialized document store at {:?}", store.db_path);
        Ok(store)
    }

    /// Open the store described by the configuration, initializing the
    /// configured embedding backend
    pub fn from_config(config: &Config) -> Result<Self> {
        let generator = EmbeddingGenerator::from_config(&config.embedding)?;
        Self::open(config.db_path()?, generator)
    }

    pub fn generator(&self) -> &EmbeddingGenerator {
        &self.generator
    }

    /// Open a connection scoped to a single call.
    ///
    /// WAL keeps readers unblocked while another process writes; the busy
    /// timeout makes a contending writer wait up to the bound instead of
    /// failing immediately. The connection closes on drop, on every exit
    /// path.
    fn connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {};",
            BUSY_TIMEOUT_MS
        ))?;
        Ok(conn)
    }

    /// Apply the fixed, versioned schema
    fn migrate(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);
                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Embed and persist a batch of candidate documents.
    ///
    /// Candidates are admitted in order; drops are logged and skipped without
    /// aborting the batch. Each kept document and its vector entry are
    /// inserted as one atomic unit inside a transaction spanning the whole
    /// batch: any storage or embedding failure rolls the entire batch back
    /// and is re-raised, so no partial batch is ever visible. Returns the
    /// number of documents actually inserted after filtering.
    pub fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;

        for doc in documents {
            if let Err(reason) = admit(doc) {
                report_drop(doc, reason);
                continue;
            }

            let embedding = self.generator.embed(&doc.content)?;

            let id = Uuid::new_v4();
            let metadata = serde_json::to_string(&doc.metadata).map_err(|e| MnemoError::Json {
                source: e,
                context: format!("Failed to encode metadata for document {}", id),
            })?;

            tx.execute(
                "INSERT INTO documents (id, source, content, metadata) VALUES (?1, ?2, ?3, ?4)",
                params![id.to_string(), doc.source, doc.content, metadata],
            )?;

            // The rowid is the internal join key between a document and its
            // vector entry; it is never exposed outside the store
            let rowid = tx.last_insert_rowid();
            self.index.insert(&tx, rowid, &embedding)?;

            inserted += 1;
        }

        tx.commit()?;
        tracing::info!("Added {} documents", inserted);
        Ok(inserted)
    }

    /// Case-insensitive substring match on content.
    ///
    /// No ranking signal beyond "matched"; results carry no distance and are
    /// capped at `limit`.
    pub fn search_keyword(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let conn = self.connection()?;

        let like_query = format!("%{}%", query);
        let sql = format!(
            "SELECT source, content, metadata FROM documents
             WHERE content LIKE ?1 AND {READ_FILTER}
             LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![like_query, limit as i64], |row| {
            Ok(SearchResult {
                source: row.get(0)?,
                content: row.get(1)?,
                metadata: parse_metadata(row.get::<_, Option<String>>(2)?),
                distance: None,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Nearest-neighbor lookup joined back to documents.
    ///
    /// Returns up to `limit` candidates in ascending distance order. The
    /// write path already guarantees the storage invariants, but they are
    /// re-applied here as a read-time defense against rows that predate the
    /// filter or were inserted out of band.
    pub fn vector_lookup(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let conn = self.connection()?;
        let candidates = self.index.nearest(&conn, query_vector, limit)?;

        let sql = format!("SELECT source, content, metadata FROM documents WHERE rowid = ?1 AND {READ_FILTER}");
        let mut stmt = conn.prepare(&sql)?;

        let mut results = Vec::new();
        for (rowid, distance) in candidates {
            let row = stmt
                .query_row(params![rowid], |row| {
                    Ok(SearchResult {
                        source: row.get(0)?,
                        content: row.get(1)?,
                        metadata: parse_metadata(row.get::<_, Option<String>>(2)?),
                        distance: Some(distance),
                    })
                })
                .optional()?;
            if let Some(result) = row {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Get store statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.connection()?;

        let document_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        let vector_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM vec_documents", [], |row| row.get(0))?;

        Ok(StoreStats {
            document_count: document_count as usize,
            vector_count: vector_count as usize,
        })
    }
}

/// Store statistics
#[derive(Debug)]
pub struct StoreStats {
    pub document_count: usize,
    pub vector_count: usize,
}

fn parse_metadata(raw: Option<String>) -> crate::document::Metadata {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: documents table plus its parallel vector entries
    r#"
    CREATE TABLE documents (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata TEXT
    );

    CREATE INDEX idx_documents_source ON documents(source);

    -- One vector entry per document, keyed by the document's rowid
    CREATE TABLE vec_documents (
        rowid INTEGER PRIMARY KEY,
        embedding BLOB NOT NULL
    );
    "#,
];
