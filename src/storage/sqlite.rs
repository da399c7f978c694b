//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::document::{fingerprint, Document, META_CATEGORY};
use crate::state::StopReason;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{FaultRecord, RunRecord, RunStatus};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, stop_reason, document_count";

const DOCUMENT_COLUMNS: &str =
    "id, title, abstract_text, text, web_link, local_link, pub_date, load_date";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_metadata(&self, document_id: i64) -> StorageResult<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM document_metadata WHERE document_id = ?1")?;

        let metadata = stmt
            .query_map(params![document_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(metadata)
    }

    fn query_documents(&self, sql: &str, run_id: i64) -> StorageResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![run_id], DocumentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| {
                let metadata = self.load_metadata(row.id)?;
                row.into_document(metadata)
            })
            .collect()
    }
}

/// Raw `documents` row, converted to a [`Document`] once its metadata is loaded
struct DocumentRow {
    id: i64,
    title: String,
    abstract_text: Option<String>,
    text: Option<String>,
    web_link: String,
    local_link: Option<String>,
    pub_date: Option<String>,
    load_date: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            abstract_text: row.get(2)?,
            text: row.get(3)?,
            web_link: row.get(4)?,
            local_link: row.get(5)?,
            pub_date: row.get(6)?,
            load_date: row.get(7)?,
        })
    }

    fn into_document(self, metadata: BTreeMap<String, String>) -> StorageResult<Document> {
        let pub_date = self.pub_date.as_deref().map(parse_timestamp).transpose()?;
        let load_date = parse_timestamp(&self.load_date)?;

        Ok(Document {
            title: self.title,
            abstract_text: self.abstract_text,
            text: self.text,
            web_link: self.web_link,
            local_link: self.local_link,
            metadata,
            pub_date,
            load_date,
        })
    }
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("timestamp '{}': {}", value, e)))
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let stop_reason: Option<String> = row.get(5)?;
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
        stop_reason: stop_reason.as_deref().and_then(StopReason::from_db_string),
        document_count: row.get::<_, i64>(6)? as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn list_runs(&self) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs ORDER BY id", RUN_COLUMNS))?;

        let runs = stmt
            .query_map([], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stop_reason: Option<StopReason>,
        document_count: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, stop_reason = ?2, document_count = ?3, finished_at = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                stop_reason.map(|r| r.to_db_string()),
                document_count as i64,
                now,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Documents =====

    fn insert_documents(&mut self, run_id: i64, documents: &[Document]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        for (position, doc) in documents.iter().enumerate() {
            tx.execute(
                "INSERT INTO documents (run_id, position, fingerprint, title, abstract_text, text,
                 web_link, local_link, pub_date, load_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    run_id,
                    position as i64,
                    fingerprint(doc).as_str(),
                    doc.title,
                    doc.abstract_text,
                    doc.text,
                    doc.web_link,
                    doc.local_link,
                    doc.pub_date.map(|d| d.to_rfc3339()),
                    doc.load_date.to_rfc3339(),
                ],
            )?;
            let document_id = tx.last_insert_rowid();

            for (key, value) in &doc.metadata {
                tx.execute(
                    "INSERT INTO document_metadata (document_id, key, value) VALUES (?1, ?2, ?3)",
                    params![document_id, key, value],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_documents(&self, run_id: i64) -> StorageResult<Vec<Document>> {
        self.query_documents(
            &format!(
                "SELECT {} FROM documents WHERE run_id = ?1 ORDER BY position",
                DOCUMENT_COLUMNS
            ),
            run_id,
        )
    }

    /// Returns position 0 of the latest run that stored documents
    ///
    /// Listings are ordered newest first, so the first document a run accepted
    /// is the newest one it saw. The next run stops when it reaches that
    /// document again; using the last accepted document instead would make it
    /// re-harvest everything the previous run already stored.
    fn load_boundary_document(&self) -> StorageResult<Option<Document>> {
        let latest: Option<i64> = self
            .conn
            .query_row("SELECT MAX(run_id) FROM documents", [], |row| row.get(0))?;

        let Some(run_id) = latest else {
            return Ok(None);
        };

        let documents = self.query_documents(
            &format!(
                "SELECT {} FROM documents WHERE run_id = ?1 AND position = 0",
                DOCUMENT_COLUMNS
            ),
            run_id,
        )?;

        Ok(documents.into_iter().next())
    }

    // ===== Faults =====

    fn record_fault(
        &mut self,
        run_id: i64,
        category: &str,
        kind: &str,
        url: &str,
        message: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO faults (run_id, category, kind, url, message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![run_id, category, kind, url, message, now],
        )?;
        Ok(())
    }

    fn get_faults(&self, run_id: i64) -> StorageResult<Vec<FaultRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, category, kind, url, message, recorded_at
             FROM faults WHERE run_id = ?1 ORDER BY id",
        )?;

        let faults = stmt
            .query_map(params![run_id], |row| {
                Ok(FaultRecord {
                    run_id: row.get(0)?,
                    category: row.get(1)?,
                    kind: row.get(2)?,
                    url: row.get(3)?,
                    message: row.get(4)?,
                    recorded_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(faults)
    }

    // ===== Statistics =====

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_documents(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_documents_by_category(&self) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT value, COUNT(*) FROM document_metadata WHERE key = ?1 GROUP BY value",
        )?;

        let rows = stmt.query_map(params![META_CATEGORY], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (category, count) = row?;
            counts.insert(category, count as u64);
        }

        Ok(counts)
    }

    fn get_fault_summary(&self) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM faults GROUP BY kind")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut summary = BTreeMap::new();
        for row in rows {
            let (kind, count) = row?;
            summary.insert(kind, count as u64);
        }

        Ok(summary)
    }
}
