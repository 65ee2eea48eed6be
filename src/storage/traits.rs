//! Storage trait definitions

use crate::host::{QueryLog, Term};
use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Taxonomy not found: {0}")]
    TaxonomyNotFound(String),

    #[error("Record not found: {0}")]
    RecordNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A record about to be inserted.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub source_id: i64,
    pub site: String,
    pub post_type: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub author_id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub revision_of: Option<i64>,
}

/// A record read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: i64,
    pub source_id: i64,
    pub site: String,
    pub post_type: String,
    pub title: String,
    pub author_id: Option<i64>,
    pub revision_of: Option<i64>,
}

/// Classification group and term lookups the extra-terms hook relies on.
pub trait TaxonomyLookup {
    /// True if the group is registered with the store
    fn taxonomy_exists(&self, taxonomy: &str) -> StorageResult<bool>;

    /// True if the group's terms form a parent/child hierarchy
    fn is_hierarchical(&self, taxonomy: &str) -> StorageResult<bool>;

    /// Fetch a term by reference: numeric references match the term id,
    /// anything else matches the slug.
    fn get_term(&self, reference: &str, taxonomy: &str) -> StorageResult<Option<Term>>;
}

/// Record metadata writes.
pub trait MetadataWriter {
    /// Append a metadata entry to a record. Never deduplicates.
    fn add_meta(&self, record_id: i64, key: &str, value: &str) -> StorageResult<i64>;
}

/// The content store an import writes into.
pub trait ContentStore: TaxonomyLookup + MetadataWriter {
    /// Register a classification group (no-op if it exists)
    fn register_taxonomy(&self, taxonomy: &str, hierarchical: bool) -> StorageResult<()>;

    /// Insert a record, returning its store id
    fn insert_record(&self, record: &NewRecord) -> StorageResult<i64>;

    /// Find a previously imported record by its export id and site
    fn find_by_source(&self, site: &str, source_id: i64) -> StorageResult<Option<i64>>;

    /// Load a record by store id
    fn load_record(&self, record_id: i64) -> StorageResult<Option<StoredRecord>>;

    /// Find a term by group and slug, creating it if missing
    fn ensure_term(
        &self,
        taxonomy: &str,
        slug: &str,
        name: &str,
        parent: Option<i64>,
    ) -> StorageResult<Term>;

    /// Attach a term to a record (no-op if already attached)
    fn relate_term(&self, record_id: i64, term_id: i64) -> StorageResult<()>;

    /// Terms attached to a record, in attachment order
    fn terms_for(&self, record_id: i64) -> StorageResult<Vec<Term>>;

    /// Metadata entries of a record, in write order
    fn meta_for(&self, record_id: i64) -> StorageResult<Vec<(String, String)>>;

    /// Find an author by login, creating it if missing
    fn ensure_author(&self, login: &str) -> StorageResult<i64>;

    /// Handle to the trace collector this store records into
    fn query_log(&self) -> QueryLog;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: ContentStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
