// crates/docchain-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Registry Store
// Description: Durable DocumentStore and AuditLog backed by SQLite WAL.
// Purpose: Persist documents and the bounded audit trail with integrity checks.
// Dependencies: docchain-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Documents live in a keyed `documents` table with an insertion sequence and
//! a secondary index on `file_hash`. Audit events are stored as canonical JSON
//! with their hash in `audit_events`; reads recompute the hash and fail closed
//! on mismatch. Each append trims the table to the configured retention in
//! the same transaction.
//!
//! Conditional registry writes run in a `BEGIN IMMEDIATE` transaction, which
//! takes the database write lock before the existing row is read. Every
//! handle on the same file, in this process or another, waits on that lock
//! (bounded by the busy timeout), so the check and the record plus its audit
//! row commit as one unit.
//!
//! Security posture: database contents are untrusted and validated on load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use docchain_core::AnchorRef;
use docchain_core::AnchorWrite;
use docchain_core::AuditAction;
use docchain_core::AuditEvent;
use docchain_core::AuditLog;
use docchain_core::DEFAULT_AUDIT_RETENTION;
use docchain_core::DocumentId;
use docchain_core::DocumentRecord;
use docchain_core::DocumentStore;
use docchain_core::FileName;
use docchain_core::HashAlgorithm;
use docchain_core::HashDigest;
use docchain_core::Owner;
use docchain_core::RegistryBackend;
use docchain_core::StoreError;
use docchain_core::Timestamp;
use docchain_core::hashing::DEFAULT_HASH_ALGORITHM;
use docchain_core::hashing::canonical_json_bytes;
use docchain_core::hashing::hash_bytes;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Column list shared by document queries.
const DOCUMENT_COLUMNS: &str = "document_id, file_name, file_hash, owner, created_at, anchored, \
                                anchor_tx_id, anchor_block_number, anchored_at";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` registry store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
/// - `audit_retention` must be greater than zero.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Maximum number of retained audit events.
    #[serde(default = "default_audit_retention")]
    pub audit_retention: usize,
}

impl SqliteStoreConfig {
    /// Creates a configuration with defaults for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            audit_retention: DEFAULT_AUDIT_RETENTION,
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default audit retention bound.
const fn default_audit_retention() -> usize {
    DEFAULT_AUDIT_RETENTION
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw event payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a `rusqlite` error into a store error.
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed document store and audit log with WAL support.
///
/// # Invariants
/// - Audit loads verify stored hashes before deserialization.
/// - `SQLite` connection access is serialized through a mutex.
/// - Conditional writes hold the database write lock from check to commit.
#[derive(Clone)]
pub struct SqliteRegistryStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Maximum retained audit events.
    audit_retention: usize,
}

impl SqliteRegistryStore {
    /// Opens an `SQLite`-backed registry store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the configuration is invalid or the
    /// database cannot be opened or initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        if config.audit_retention == 0 {
            return Err(SqliteStoreError::Invalid(
                "audit_retention must be greater than zero".to_string(),
            ));
        }
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            audit_retention: config.audit_retention,
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Runs a single-row document query.
    fn query_document(
        &self,
        sql: &str,
        param: &str,
    ) -> Result<Option<DocumentRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        select_document(&guard, sql, param)
    }

    /// Loads every document row in listing order.
    fn load_documents(&self) -> Result<Vec<DocumentRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        let rows = {
            let mut stmt = guard
                .prepare_cached(&format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at DESC, seq DESC"
                ))
                .map_err(|err| db_error(&err))?;
            let mapped = stmt.query_map([], map_document_row).map_err(|err| db_error(&err))?;
            mapped.collect::<Result<Vec<_>, _>>().map_err(|err| db_error(&err))?
        };
        drop(guard);
        rows.into_iter().map(DocumentRow::into_record).collect()
    }

    /// Runs a `COUNT` query.
    fn count_rows(&self, sql: &str, param: Option<&str>) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        let count: i64 = match param {
            Some(value) => guard.query_row(sql, params![value], |row| row.get::<_, i64>(0)),
            None => guard.query_row(sql, [], |row| row.get::<_, i64>(0)),
        }
        .map_err(|err| db_error(&err))?;
        u64::try_from(count)
            .map_err(|_| SqliteStoreError::Corrupt(format!("negative row count: {count}")))
    }

    /// Returns the retention bound as an `SQLite` integer.
    fn retention_param(&self) -> Result<i64, SqliteStoreError> {
        i64::try_from(self.audit_retention)
            .map_err(|_| SqliteStoreError::Invalid("audit_retention too large".to_string()))
    }

    /// Runs `body` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The transaction commits only when `body` asks for it; otherwise it
    /// rolls back on drop.
    fn immediate<T>(
        &self,
        body: impl FnOnce(&Transaction<'_>) -> Result<(T, bool), SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_error(&err))?;
        let (value, commit) = body(&tx)?;
        if commit {
            tx.commit().map_err(|err| db_error(&err))?;
        }
        Ok(value)
    }
}

// ============================================================================
// SECTION: Document Store
// ============================================================================

impl DocumentStore for SqliteRegistryStore {
    fn upsert(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        let columns = DocumentParams::new(record)?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        write_document(&tx, &columns)?;
        tx.commit().map_err(|err| db_error(&err))?;
        Ok(())
    }

    fn get(&self, document_id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(self.query_document(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = ?1"),
            document_id.as_str(),
        )?)
    }

    fn find_by_hash(&self, normalized_hash: &str) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(self.query_document(
            &format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE file_hash = ?1 ORDER BY seq ASC \
                 LIMIT 1"
            ),
            normalized_hash,
        )?)
    }

    fn list_all(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self.load_documents()?)
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.count_rows("SELECT COUNT(1) FROM documents", None)?)
    }

    fn count_where(
        &self,
        predicate: &dyn Fn(&DocumentRecord) -> bool,
    ) -> Result<u64, StoreError> {
        let matched = self.load_documents()?.iter().filter(|record| predicate(record)).count();
        Ok(u64::try_from(matched).unwrap_or(u64::MAX))
    }
}

// ============================================================================
// SECTION: Audit Log
// ============================================================================

impl AuditLog for SqliteRegistryStore {
    fn append(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let encoded = EncodedEvent::new(event)?;
        let retention = self.retention_param()?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        write_audit_event(&tx, &encoded, retention)?;
        tx.commit().map_err(|err| db_error(&err))?;
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<AuditEvent>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let guard = self.lock()?;
        let rows = {
            let mut stmt = guard
                .prepare_cached(
                    "SELECT seq, event_json, event_hash, hash_algorithm FROM audit_events ORDER \
                     BY seq DESC LIMIT ?1",
                )
                .map_err(|err| db_error(&err))?;
            let mapped = stmt
                .query_map(params![limit], |row| {
                    Ok(AuditRow {
                        seq: row.get(0)?,
                        bytes: row.get(1)?,
                        hash_value: row.get(2)?,
                        hash_algorithm: row.get(3)?,
                    })
                })
                .map_err(|err| db_error(&err))?;
            mapped.collect::<Result<Vec<_>, _>>().map_err(|err| db_error(&err))?
        };
        drop(guard);
        Ok(rows.into_iter().map(AuditRow::into_event).collect::<Result<Vec<_>, _>>()?)
    }

    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.count_rows("SELECT COUNT(1) FROM audit_events", None)?)
    }

    fn count_action(&self, action: AuditAction) -> Result<u64, StoreError> {
        Ok(self.count_rows(
            "SELECT COUNT(1) FROM audit_events WHERE action = ?1",
            Some(action.as_str()),
        )?)
    }

    fn retention(&self) -> usize {
        self.audit_retention
    }
}

// ============================================================================
// SECTION: Registry Backend
// ============================================================================

impl RegistryBackend for SqliteRegistryStore {
    fn insert_if_absent(
        &self,
        record: &DocumentRecord,
        event: &AuditEvent,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        let columns = DocumentParams::new(record)?;
        let encoded = EncodedEvent::new(event)?;
        let retention = self.retention_param()?;
        Ok(self.immediate(|tx| {
            let existing = select_document(
                tx,
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = ?1"),
                record.document_id.as_str(),
            )?;
            if existing.is_some() {
                return Ok((existing, false));
            }
            write_document(tx, &columns)?;
            write_audit_event(tx, &encoded, retention)?;
            Ok((None, true))
        })?)
    }

    fn anchor_if_unanchored(
        &self,
        document_id: &DocumentId,
        anchor_ref: &AnchorRef,
        anchored_at: Timestamp,
        event: &AuditEvent,
    ) -> Result<AnchorWrite, StoreError> {
        let encoded = EncodedEvent::new(event)?;
        let retention = self.retention_param()?;
        let block_number = block_number_param(anchor_ref.block_number)?;
        Ok(self.immediate(|tx| {
            let Some(record) = select_document(
                tx,
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = ?1"),
                document_id.as_str(),
            )?
            else {
                return Ok((AnchorWrite::Missing, false));
            };
            if record.anchored {
                return Ok((AnchorWrite::AlreadyAnchored(record), false));
            }
            let changed = tx
                .execute(
                    "UPDATE documents SET anchored = 1, anchor_tx_id = ?2, anchor_block_number \
                     = ?3, anchored_at = ?4 WHERE document_id = ?1 AND anchored = 0",
                    params![
                        document_id.as_str(),
                        anchor_ref.external_tx_id.as_str(),
                        block_number,
                        anchored_at.as_unix_millis()
                    ],
                )
                .map_err(|err| db_error(&err))?;
            if changed != 1 {
                return Err(SqliteStoreError::Corrupt(format!(
                    "anchor update for {document_id} changed {changed} rows"
                )));
            }
            write_audit_event(tx, &encoded, retention)?;
            let updated = record.into_anchored(anchor_ref.clone(), anchored_at);
            Ok((AnchorWrite::Anchored(updated), true))
        })?)
    }
}

// ============================================================================
// SECTION: Statements
// ============================================================================

/// Document columns prepared for binding.
struct DocumentParams<'a> {
    /// Source record.
    record: &'a DocumentRecord,
    /// Anchor transaction id.
    anchor_tx_id: Option<&'a str>,
    /// Anchor block number.
    anchor_block_number: Option<i64>,
}

impl<'a> DocumentParams<'a> {
    /// Converts record fields into `SQLite` parameters.
    fn new(record: &'a DocumentRecord) -> Result<Self, SqliteStoreError> {
        let (anchor_tx_id, anchor_block_number) = match &record.anchor_ref {
            Some(anchor) => {
                (Some(anchor.external_tx_id.as_str()), block_number_param(anchor.block_number)?)
            }
            None => (None, None),
        };
        Ok(Self {
            record,
            anchor_tx_id,
            anchor_block_number,
        })
    }
}

/// Audit event encoded for storage.
struct EncodedEvent {
    /// Action label for the indexed column.
    action: &'static str,
    /// Canonical JSON bytes.
    json: Vec<u8>,
    /// Digest of `json`.
    digest: HashDigest,
}

impl EncodedEvent {
    /// Canonicalizes and hashes an event.
    fn new(event: &AuditEvent) -> Result<Self, SqliteStoreError> {
        let json = canonical_json_bytes(event)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &json);
        Ok(Self {
            action: event.action.as_str(),
            json,
            digest,
        })
    }
}

/// Converts an optional block number into an `SQLite` integer.
fn block_number_param(block_number: Option<u64>) -> Result<Option<i64>, SqliteStoreError> {
    block_number
        .map(|block| {
            i64::try_from(block)
                .map_err(|_| SqliteStoreError::Invalid(format!("block number too large: {block}")))
        })
        .transpose()
}

/// Runs a single-row document query on `connection`.
fn select_document(
    connection: &Connection,
    sql: &str,
    param: &str,
) -> Result<Option<DocumentRecord>, SqliteStoreError> {
    let row = connection
        .query_row(sql, params![param], map_document_row)
        .optional()
        .map_err(|err| db_error(&err))?;
    row.map(DocumentRow::into_record).transpose()
}

/// Inserts or overwrites a document row, keeping its sequence on overwrite.
fn write_document(
    connection: &Connection,
    columns: &DocumentParams<'_>,
) -> Result<(), SqliteStoreError> {
    let record = columns.record;
    let mut stmt = connection
        .prepare_cached(
            "INSERT INTO documents (document_id, file_name, file_hash, owner, created_at, \
             anchored, anchor_tx_id, anchor_block_number, anchored_at) VALUES (?1, ?2, ?3, ?4, \
             ?5, ?6, ?7, ?8, ?9) ON CONFLICT(document_id) DO UPDATE SET file_name = \
             excluded.file_name, file_hash = excluded.file_hash, owner = excluded.owner, \
             created_at = excluded.created_at, anchored = excluded.anchored, anchor_tx_id = \
             excluded.anchor_tx_id, anchor_block_number = excluded.anchor_block_number, \
             anchored_at = excluded.anchored_at",
        )
        .map_err(|err| db_error(&err))?;
    stmt.execute(params![
        record.document_id.as_str(),
        record.file_name.as_str(),
        record.file_hash.as_str(),
        record.owner.as_str(),
        record.created_at.as_unix_millis(),
        record.anchored,
        columns.anchor_tx_id,
        columns.anchor_block_number,
        record.anchored_at.map(Timestamp::as_unix_millis)
    ])
    .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Inserts an audit row and trims the table to `retention` rows.
fn write_audit_event(
    connection: &Connection,
    encoded: &EncodedEvent,
    retention: i64,
) -> Result<(), SqliteStoreError> {
    connection
        .execute(
            "INSERT INTO audit_events (action, event_json, event_hash, hash_algorithm) VALUES \
             (?1, ?2, ?3, ?4)",
            params![
                encoded.action,
                encoded.json.as_slice(),
                encoded.digest.value.as_str(),
                encoded.digest.algorithm.label()
            ],
        )
        .map_err(|err| db_error(&err))?;
    enforce_retention(connection, retention)
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Raw document row.
#[derive(Debug)]
struct DocumentRow {
    /// Stored document id.
    document_id: String,
    /// Stored display name.
    file_name: String,
    /// Stored fingerprint.
    file_hash: String,
    /// Stored owner label.
    owner: String,
    /// Creation time in unix millis.
    created_at: i64,
    /// Anchored flag.
    anchored: bool,
    /// Anchor transaction id.
    anchor_tx_id: Option<String>,
    /// Anchor block number.
    anchor_block_number: Option<i64>,
    /// Anchor time in unix millis.
    anchored_at: Option<i64>,
}

/// Maps a `documents` row selected with [`DOCUMENT_COLUMNS`].
fn map_document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        document_id: row.get(0)?,
        file_name: row.get(1)?,
        file_hash: row.get(2)?,
        owner: row.get(3)?,
        created_at: row.get(4)?,
        anchored: row.get(5)?,
        anchor_tx_id: row.get(6)?,
        anchor_block_number: row.get(7)?,
        anchored_at: row.get(8)?,
    })
}

impl DocumentRow {
    /// Validates the row and builds a record.
    fn into_record(self) -> Result<DocumentRecord, SqliteStoreError> {
        let corrupt = |detail: &str| {
            SqliteStoreError::Corrupt(format!("document {}: {detail}", self.document_id))
        };
        let file_name =
            FileName::parse(&self.file_name).map_err(|_| corrupt("invalid file_name"))?;
        let owner = Owner::parse(&self.owner).map_err(|_| corrupt("invalid owner"))?;
        let anchor_ref = match (self.anchored, self.anchor_tx_id, self.anchored_at) {
            (false, None, None) => None,
            (true, Some(external_tx_id), Some(_)) => {
                let block_number = self
                    .anchor_block_number
                    .map(u64::try_from)
                    .transpose()
                    .map_err(|_| corrupt("negative block number"))?;
                Some(AnchorRef {
                    external_tx_id,
                    block_number,
                })
            }
            _ => return Err(corrupt("inconsistent anchor columns")),
        };
        Ok(DocumentRecord {
            document_id: DocumentId::from_stored(self.document_id),
            file_name,
            file_hash: self.file_hash,
            owner,
            created_at: Timestamp::from_unix_millis(self.created_at),
            anchor_ref,
            anchored: self.anchored,
            anchored_at: self.anchored_at.map(Timestamp::from_unix_millis),
        })
    }
}

/// Raw audit row.
#[derive(Debug)]
struct AuditRow {
    /// Row sequence.
    seq: i64,
    /// Stored canonical JSON bytes.
    bytes: Vec<u8>,
    /// Stored hash value.
    hash_value: String,
    /// Stored hash algorithm label.
    hash_algorithm: String,
}

impl AuditRow {
    /// Verifies the stored hash and decodes the event.
    fn into_event(self) -> Result<AuditEvent, SqliteStoreError> {
        let algorithm = parse_hash_algorithm(&self.hash_algorithm)?;
        let digest = hash_bytes(algorithm, &self.bytes);
        if digest.value != self.hash_value {
            return Err(SqliteStoreError::Corrupt(format!(
                "hash mismatch for audit event {}",
                self.seq
            )));
        }
        serde_json::from_slice(&self.bytes).map_err(|err| {
            SqliteStoreError::Corrupt(format!("audit event {} decode failed: {err}", self.seq))
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS documents (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    document_id TEXT NOT NULL UNIQUE,
                    file_name TEXT NOT NULL,
                    file_hash TEXT NOT NULL,
                    owner TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    anchored INTEGER NOT NULL,
                    anchor_tx_id TEXT,
                    anchor_block_number INTEGER,
                    anchored_at INTEGER
                );
                CREATE INDEX IF NOT EXISTS idx_documents_file_hash
                    ON documents (file_hash, seq);
                CREATE INDEX IF NOT EXISTS idx_documents_created_at
                    ON documents (created_at, seq);
                CREATE TABLE IF NOT EXISTS audit_events (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    action TEXT NOT NULL,
                    event_json BLOB NOT NULL,
                    event_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_audit_events_action
                    ON audit_events (action);",
            )
            .map_err(|err| db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(())
}

/// Deletes audit rows older than the newest `retention` rows.
fn enforce_retention(connection: &Connection, retention: i64) -> Result<(), SqliteStoreError> {
    connection.execute(
        "DELETE FROM audit_events WHERE seq <= (SELECT seq FROM audit_events ORDER BY seq DESC \
         LIMIT 1 OFFSET ?1)",
        params![retention],
    )
    .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Parses a stored hash algorithm label.
fn parse_hash_algorithm(label: &str) -> Result<HashAlgorithm, SqliteStoreError> {
    HashAlgorithm::from_label(label)
        .ok_or_else(|| SqliteStoreError::Invalid(format!("unsupported hash algorithm: {label}")))
}
