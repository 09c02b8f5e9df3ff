use crate::chunker::{ChunkMetadata, ChunkStats, TextChunk};
use crate::embedder::ChunkEmbedding;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use std::path::Path;
use uuid::Uuid;

const CHUNK_COLUMNS: &str = "content, chunk_index, token_count, start_char, end_char, \
     start_page, end_page, section_title, chunk_level, parent_chunk_index, metadata, \
     content_hash, embedding_id";

/// SQLite persistence for chunked documents
pub struct ChunkStore {
    conn: Connection,
}

impl ChunkStore {
    /// Create a new in-memory database
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT,
                page_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                token_count INTEGER NOT NULL,
                start_char INTEGER NOT NULL,
                end_char INTEGER NOT NULL,
                start_page INTEGER,
                end_page INTEGER,
                section_title TEXT,
                chunk_level INTEGER NOT NULL DEFAULT 0,
                parent_chunk_index INTEGER,
                metadata TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                embedding_id TEXT,
                embedding_model TEXT,
                embedding_dimension INTEGER,
                embedding BLOB,
                PRIMARY KEY (document_id, chunk_index),
                FOREIGN KEY (document_id) REFERENCES documents(id),
                FOREIGN KEY (document_id, parent_chunk_index)
                    REFERENCES chunks(document_id, chunk_index)
                    DEFERRABLE INITIALLY DEFERRED
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_parent ON chunks(document_id, parent_chunk_index);
            CREATE INDEX IF NOT EXISTS idx_chunks_hash ON chunks(content_hash);
            "#,
            )
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Insert or refresh a document record
    pub fn upsert_document(&self, id: &str, title: Option<&str>, page_count: usize) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO documents (id, title, page_count, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title, page_count = excluded.page_count",
                params![id, title, page_count, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Failed to upsert document: {}", id))?;
        Ok(())
    }

    /// Replace every stored chunk of a document, returning how many were written
    pub fn store_chunks(&mut self, document_id: &str, chunks: &[TextChunk]) -> Result<usize> {
        let tx = self.conn.transaction().context("Failed to begin transaction")?;

        tx.execute("DELETE FROM chunks WHERE document_id = ?1", params![document_id])
            .with_context(|| format!("Failed to clear chunks of {}", document_id))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO chunks (document_id, {CHUNK_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
                ))
                .context("Failed to prepare statement")?;

            for chunk in chunks {
                let metadata =
                    serde_json::to_string(&chunk.metadata).context("Failed to encode metadata")?;
                stmt.execute(params![
                    document_id,
                    chunk.content,
                    chunk.chunk_index,
                    chunk.token_count,
                    chunk.start_char,
                    chunk.end_char,
                    chunk.start_page,
                    chunk.end_page,
                    chunk.section_title,
                    chunk.chunk_level,
                    chunk.parent_chunk_id,
                    metadata,
                    chunk.content_hash,
                    chunk.embedding_id.map(|id| id.to_string()),
                ])
                .with_context(|| {
                    format!("Failed to insert chunk {} of {}", chunk.chunk_index, document_id)
                })?;
            }
        }

        tx.commit().context("Failed to commit chunks")?;
        Ok(chunks.len())
    }

    /// Chunks of a document ordered by index; only level-0 rows unless `include_hierarchy`
    pub fn document_chunks(&self, document_id: &str, include_hierarchy: bool) -> Result<Vec<TextChunk>> {
        let filter = if include_hierarchy { "" } else { "AND chunk_level = 0" };
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {CHUNK_COLUMNS} FROM chunks WHERE document_id = ?1 {filter} ORDER BY chunk_index"
            ))
            .context("Failed to prepare statement")?;

        let chunks = stmt
            .query_map(params![document_id], row_to_chunk)
            .context("Failed to query chunks")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect chunks")?;

        Ok(chunks)
    }

    /// Case-insensitive substring search over chunk content
    pub fn search_chunks(&self, document_id: &str, query: &str, limit: usize) -> Result<Vec<TextChunk>> {
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {CHUNK_COLUMNS} FROM chunks
                 WHERE document_id = ?1 AND lower(content) LIKE lower(?2) ESCAPE '\\'
                 ORDER BY chunk_index LIMIT ?3"
            ))
            .context("Failed to prepare statement")?;

        let chunks = stmt
            .query_map(params![document_id, pattern, limit], row_to_chunk)
            .context("Failed to search chunks")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect chunks")?;

        Ok(chunks)
    }

    pub fn chunk_statistics(&self, document_id: &str) -> Result<ChunkStats> {
        let chunks = self.document_chunks(document_id, true)?;
        Ok(ChunkStats::from_chunks(&chunks))
    }

    /// Record an embedding against a stored chunk
    pub fn attach_embedding(&self, document_id: &str, embedding: &ChunkEmbedding, model: &str) -> Result<()> {
        // Vectors are stored as little-endian f32 bytes
        let vector_bytes: Vec<u8> = embedding.vector.iter().flat_map(|f| f.to_le_bytes()).collect();

        let updated = self
            .conn
            .execute(
                "UPDATE chunks SET embedding_id = ?1, embedding_model = ?2, embedding_dimension = ?3, embedding = ?4
                 WHERE document_id = ?5 AND chunk_index = ?6",
                params![
                    embedding.embedding_id.to_string(),
                    model,
                    embedding.vector.len(),
                    vector_bytes,
                    document_id,
                    embedding.chunk_index,
                ],
            )
            .with_context(|| format!("Failed to attach embedding to chunk {}", embedding.chunk_index))?;

        if updated == 0 {
            bail!(
                "No chunk {} stored for document {}",
                embedding.chunk_index,
                document_id
            );
        }
        Ok(())
    }

    /// Stored embedding vector of a chunk, if any
    pub fn chunk_embedding(&self, document_id: &str, chunk_index: usize) -> Result<Option<Vec<f32>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT embedding FROM chunks WHERE document_id = ?1 AND chunk_index = ?2")
            .context("Failed to prepare statement")?;

        let mut rows = stmt
            .query(params![document_id, chunk_index])
            .context("Failed to query embedding")?;

        let Some(row) = rows.next().context("Failed to get next row")? else {
            return Ok(None);
        };
        let vector_bytes: Option<Vec<u8>> = row.get(0)?;

        Ok(vector_bytes.map(|bytes| {
            bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        }))
    }
}

fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<TextChunk> {
    let metadata: String = row.get(10)?;
    let metadata: ChunkMetadata = serde_json::from_str(&metadata)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    let embedding_id: Option<String> = row.get(12)?;
    let embedding_id = embedding_id
        .map(|id| Uuid::parse_str(&id))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

    Ok(TextChunk {
        content: row.get(0)?,
        chunk_index: row.get(1)?,
        token_count: row.get(2)?,
        start_char: row.get(3)?,
        end_char: row.get(4)?,
        start_page: row.get(5)?,
        end_page: row.get(6)?,
        section_title: row.get(7)?,
        chunk_level: row.get(8)?,
        parent_chunk_id: row.get(9)?,
        metadata,
        content_hash: row.get(11)?,
        embedding_id,
    })
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
