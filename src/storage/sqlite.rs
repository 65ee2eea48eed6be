//! SQLite storage backend

use super::traits::{
    ContentStore, MetadataWriter, NewRecord, OpenStore, StorageError, StorageResult, StoredRecord,
    TaxonomyLookup,
};
use crate::host::{group, QueryLog, QueryTrace, Term};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::panic::Location;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

/// SQLite-backed content store
///
/// Uses a single SQLite database with tables for taxonomies, terms, authors,
/// records, record/term relationships and record metadata.
/// Thread-safe via internal mutex on the connection.
///
/// Every statement goes through `traced()`, which reports the statement,
/// its elapsed time and the calling site to the store's `QueryLog`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    log: QueryLog,
}

impl SqliteStore {
    /// Initialize the database schema and seed the built-in taxonomies
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS taxonomies (
                name TEXT PRIMARY KEY,
                hierarchical INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS terms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                taxonomy TEXT NOT NULL,
                slug TEXT NOT NULL,
                name TEXT NOT NULL,
                parent INTEGER,
                UNIQUE (taxonomy, slug),
                FOREIGN KEY (taxonomy) REFERENCES taxonomies(name)
            );

            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                login TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL,
                site TEXT NOT NULL,
                post_type TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                status TEXT NOT NULL,
                author_id INTEGER,
                date TEXT,
                revision_of INTEGER,
                FOREIGN KEY (author_id) REFERENCES authors(id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_source
                ON records(site, source_id);

            CREATE TABLE IF NOT EXISTS record_terms (
                record_id INTEGER NOT NULL,
                term_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (record_id, term_id),
                FOREIGN KEY (record_id) REFERENCES records(id) ON DELETE CASCADE,
                FOREIGN KEY (term_id) REFERENCES terms(id) ON DELETE CASCADE
            );

            -- No uniqueness on (record_id, meta_key): metadata writes always append
            CREATE TABLE IF NOT EXISTS record_meta (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_id INTEGER NOT NULL,
                meta_key TEXT NOT NULL,
                meta_value TEXT NOT NULL,
                FOREIGN KEY (record_id) REFERENCES records(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_record_meta_record
                ON record_meta(record_id);

            PRAGMA foreign_keys = ON;
            "#,
        )?;

        let mut seed = conn.prepare(
            "INSERT OR IGNORE INTO taxonomies (name, hierarchical) VALUES (?1, ?2)",
        )?;
        for (name, hierarchical) in [
            (group::CATEGORY, true),
            (group::POST_TAG, false),
            (group::POST_FORMAT, false),
        ] {
            seed.execute(params![name, hierarchical])?;
        }

        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            log: QueryLog::new(),
        })
    }

    /// Run one statement against the connection, reporting it to the query log.
    #[track_caller]
    fn traced<T>(
        &self,
        operation: &str,
        sql: &str,
        run: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> StorageResult<T> {
        let caller = Location::caller();
        let conn = self.conn.lock().unwrap();
        let started = Instant::now();
        let result = run(&conn);
        self.log.record(QueryTrace {
            statement: sql.to_string(),
            elapsed: started.elapsed(),
            trace: format!(
                "SqliteStore::{} <- {}:{}",
                operation,
                caller.file(),
                caller.line()
            ),
        });
        Ok(result?)
    }

    fn row_to_term(row: &Row<'_>) -> rusqlite::Result<Term> {
        Ok(Term {
            id: row.get(0)?,
            group: row.get(1)?,
            slug: row.get(2)?,
            name: row.get(3)?,
            parent: row.get(4)?,
        })
    }

    fn find_term(&self, taxonomy: &str, slug: &str) -> StorageResult<Option<Term>> {
        const SQL: &str =
            "SELECT id, taxonomy, slug, name, parent FROM terms WHERE taxonomy = ?1 AND slug = ?2";
        self.traced("find_term", SQL, |conn| {
            conn.query_row(SQL, params![taxonomy, slug], Self::row_to_term)
                .optional()
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl TaxonomyLookup for SqliteStore {
    #[track_caller]
    fn taxonomy_exists(&self, taxonomy: &str) -> StorageResult<bool> {
        const SQL: &str = "SELECT COUNT(*) > 0 FROM taxonomies WHERE name = ?1";
        self.traced("taxonomy_exists", SQL, |conn| {
            conn.query_row(SQL, params![taxonomy], |row| row.get(0))
        })
    }

    #[track_caller]
    fn is_hierarchical(&self, taxonomy: &str) -> StorageResult<bool> {
        const SQL: &str = "SELECT hierarchical FROM taxonomies WHERE name = ?1";
        let hierarchical: Option<bool> = self.traced("is_hierarchical", SQL, |conn| {
            conn.query_row(SQL, params![taxonomy], |row| row.get(0))
                .optional()
        })?;
        Ok(hierarchical.unwrap_or(false))
    }

    #[track_caller]
    fn get_term(&self, reference: &str, taxonomy: &str) -> StorageResult<Option<Term>> {
        match reference.trim().parse::<i64>() {
            Ok(id) => {
                const SQL: &str = "SELECT id, taxonomy, slug, name, parent FROM terms \
                                   WHERE taxonomy = ?1 AND id = ?2";
                self.traced("get_term", SQL, |conn| {
                    conn.query_row(SQL, params![taxonomy, id], Self::row_to_term)
                        .optional()
                })
            }
            Err(_) => self.find_term(taxonomy, reference),
        }
    }
}

impl MetadataWriter for SqliteStore {
    #[track_caller]
    fn add_meta(&self, record_id: i64, key: &str, value: &str) -> StorageResult<i64> {
        const SQL: &str =
            "INSERT INTO record_meta (record_id, meta_key, meta_value) VALUES (?1, ?2, ?3)";
        self.traced("add_meta", SQL, |conn| {
            conn.execute(SQL, params![record_id, key, value])?;
            Ok(conn.last_insert_rowid())
        })
        .map_err(|e| match e {
            StorageError::Database(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StorageError::RecordNotFound(record_id)
            }
            other => other,
        })
    }
}

impl ContentStore for SqliteStore {
    #[track_caller]
    fn register_taxonomy(&self, taxonomy: &str, hierarchical: bool) -> StorageResult<()> {
        const SQL: &str = "INSERT OR IGNORE INTO taxonomies (name, hierarchical) VALUES (?1, ?2)";
        self.traced("register_taxonomy", SQL, |conn| {
            conn.execute(SQL, params![taxonomy, hierarchical])
        })?;
        Ok(())
    }

    #[track_caller]
    fn insert_record(&self, record: &NewRecord) -> StorageResult<i64> {
        const SQL: &str = "INSERT INTO records \
            (source_id, site, post_type, title, content, status, author_id, date, revision_of) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
        self.traced("insert_record", SQL, |conn| {
            conn.execute(
                SQL,
                params![
                    record.source_id,
                    record.site,
                    record.post_type,
                    record.title,
                    record.content,
                    record.status,
                    record.author_id,
                    record.date.map(|d| d.to_rfc3339()),
                    record.revision_of,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    #[track_caller]
    fn find_by_source(&self, site: &str, source_id: i64) -> StorageResult<Option<i64>> {
        const SQL: &str = "SELECT id FROM records WHERE site = ?1 AND source_id = ?2 LIMIT 1";
        self.traced("find_by_source", SQL, |conn| {
            conn.query_row(SQL, params![site, source_id], |row| row.get(0))
                .optional()
        })
    }

    #[track_caller]
    fn load_record(&self, record_id: i64) -> StorageResult<Option<StoredRecord>> {
        const SQL: &str = "SELECT id, source_id, site, post_type, title, author_id, revision_of \
                           FROM records WHERE id = ?1";
        self.traced("load_record", SQL, |conn| {
            conn.query_row(SQL, params![record_id], |row| {
                Ok(StoredRecord {
                    id: row.get(0)?,
                    source_id: row.get(1)?,
                    site: row.get(2)?,
                    post_type: row.get(3)?,
                    title: row.get(4)?,
                    author_id: row.get(5)?,
                    revision_of: row.get(6)?,
                })
            })
            .optional()
        })
    }

    #[track_caller]
    fn ensure_term(
        &self,
        taxonomy: &str,
        slug: &str,
        name: &str,
        parent: Option<i64>,
    ) -> StorageResult<Term> {
        if let Some(existing) = self.find_term(taxonomy, slug)? {
            return Ok(existing);
        }
        if !self.taxonomy_exists(taxonomy)? {
            return Err(StorageError::TaxonomyNotFound(taxonomy.to_string()));
        }

        const SQL: &str =
            "INSERT INTO terms (taxonomy, slug, name, parent) VALUES (?1, ?2, ?3, ?4)";
        let id = self.traced("ensure_term", SQL, |conn| {
            conn.execute(SQL, params![taxonomy, slug, name, parent])?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(Term {
            id,
            group: taxonomy.to_string(),
            slug: slug.to_string(),
            name: name.to_string(),
            parent,
        })
    }

    #[track_caller]
    fn relate_term(&self, record_id: i64, term_id: i64) -> StorageResult<()> {
        const SQL: &str = "INSERT OR IGNORE INTO record_terms (record_id, term_id, position) \
            VALUES (?1, ?2, (SELECT COUNT(*) FROM record_terms WHERE record_id = ?1))";
        self.traced("relate_term", SQL, |conn| {
            conn.execute(SQL, params![record_id, term_id])
        })?;
        Ok(())
    }

    #[track_caller]
    fn terms_for(&self, record_id: i64) -> StorageResult<Vec<Term>> {
        const SQL: &str = "SELECT t.id, t.taxonomy, t.slug, t.name, t.parent \
                           FROM record_terms rt JOIN terms t ON t.id = rt.term_id \
                           WHERE rt.record_id = ?1 ORDER BY rt.position";
        self.traced("terms_for", SQL, |conn| {
            let mut stmt = conn.prepare(SQL)?;
            let terms = stmt
                .query_map(params![record_id], Self::row_to_term)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(terms)
        })
    }

    #[track_caller]
    fn meta_for(&self, record_id: i64) -> StorageResult<Vec<(String, String)>> {
        const SQL: &str =
            "SELECT meta_key, meta_value FROM record_meta WHERE record_id = ?1 ORDER BY id";
        self.traced("meta_for", SQL, |conn| {
            let mut stmt = conn.prepare(SQL)?;
            let meta = stmt
                .query_map(params![record_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(meta)
        })
    }

    #[track_caller]
    fn ensure_author(&self, login: &str) -> StorageResult<i64> {
        const SQL: &str = "INSERT OR IGNORE INTO authors (login) VALUES (?1)";
        const SELECT: &str = "SELECT id FROM authors WHERE login = ?1";
        self.traced("ensure_author", SQL, |conn| conn.execute(SQL, params![login]))?;
        self.traced("ensure_author", SELECT, |conn| {
            conn.query_row(SELECT, params![login], |row| row.get(0))
        })
    }

    fn query_log(&self) -> QueryLog {
        self.log.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn create_test_record(source_id: i64) -> NewRecord {
        NewRecord {
            source_id,
            site: "default".to_string(),
            post_type: "post".to_string(),
            title: format!("Post {}", source_id),
            content: String::new(),
            status: "publish".to_string(),
            author_id: None,
            date: None,
            revision_of: None,
        }
    }

    #[test]
    fn builtin_taxonomies_are_seeded() {
        let store = create_test_store();
        assert!(store.taxonomy_exists("category").unwrap());
        assert!(store.taxonomy_exists("post_tag").unwrap());
        assert!(!store.taxonomy_exists("color").unwrap());
        assert!(store.is_hierarchical("category").unwrap());
        assert!(!store.is_hierarchical("post_tag").unwrap());
    }

    #[test]
    fn unknown_taxonomy_is_not_hierarchical() {
        let store = create_test_store();
        assert!(!store.is_hierarchical("color").unwrap());
    }

    #[test]
    fn get_term_by_id_and_slug() {
        let store = create_test_store();
        let news = store.ensure_term("category", "news", "News", None).unwrap();

        let by_id = store.get_term(&news.id.to_string(), "category").unwrap().unwrap();
        assert_eq!(by_id.slug, "news");

        let by_slug = store.get_term("news", "category").unwrap().unwrap();
        assert_eq!(by_slug.id, news.id);

        assert!(store.get_term("999", "category").unwrap().is_none());
        assert!(store.get_term(&news.id.to_string(), "post_tag").unwrap().is_none());
    }

    #[test]
    fn ensure_term_is_idempotent() {
        let store = create_test_store();
        let first = store.ensure_term("post_tag", "rust", "Rust", None).unwrap();
        let second = store.ensure_term("post_tag", "rust", "Other label", None).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Rust");
    }

    #[test]
    fn ensure_term_rejects_unregistered_taxonomy() {
        let store = create_test_store();
        let err = store.ensure_term("color", "red", "red", None).unwrap_err();
        assert!(matches!(err, StorageError::TaxonomyNotFound(t) if t == "color"));

        store.register_taxonomy("color", false).unwrap();
        assert!(store.ensure_term("color", "red", "red", None).is_ok());
    }

    #[test]
    fn meta_writes_append() {
        let store = create_test_store();
        let id = store.insert_record(&create_test_record(1)).unwrap();
        store.add_meta(id, "source", "legacy").unwrap();
        store.add_meta(id, "source", "legacy").unwrap();
        let meta = store.meta_for(id).unwrap();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[0], ("source".to_string(), "legacy".to_string()));
    }

    #[test]
    fn meta_on_missing_record_fails() {
        let store = create_test_store();
        let err = store.add_meta(42, "k", "v").unwrap_err();
        assert!(matches!(err, StorageError::RecordNotFound(42)));
    }

    #[test]
    fn related_terms_keep_order() {
        let store = create_test_store();
        let id = store.insert_record(&create_test_record(1)).unwrap();
        let b = store.ensure_term("post_tag", "b", "b", None).unwrap();
        let a = store.ensure_term("post_tag", "a", "a", None).unwrap();
        store.relate_term(id, b.id).unwrap();
        store.relate_term(id, a.id).unwrap();
        store.relate_term(id, b.id).unwrap();

        let slugs: Vec<_> = store.terms_for(id).unwrap().into_iter().map(|t| t.slug).collect();
        assert_eq!(slugs, vec!["b", "a"]);
    }

    #[test]
    fn find_by_source_is_scoped_to_site() {
        let store = create_test_store();
        let id = store.insert_record(&create_test_record(5)).unwrap();
        assert_eq!(store.find_by_source("default", 5).unwrap(), Some(id));
        assert_eq!(store.find_by_source("other", 5).unwrap(), None);

        let loaded = store.load_record(id).unwrap().unwrap();
        assert_eq!(loaded.source_id, 5);
        assert_eq!(loaded.site, "default");
    }

    #[test]
    fn ensure_author_reuses_login() {
        let store = create_test_store();
        let a = store.ensure_author("alice").unwrap();
        let b = store.ensure_author("alice").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, store.ensure_author("bob").unwrap());
    }

    #[test]
    fn statements_are_traced_only_when_enabled() {
        let store = create_test_store();
        let log = store.query_log();
        store.taxonomy_exists("category").unwrap();
        assert!(log.is_empty());

        log.enable();
        store.taxonomy_exists("category").unwrap();
        let traces = log.take();
        assert_eq!(traces.len(), 1);
        assert!(traces[0].statement.contains("FROM taxonomies"));
        assert!(traces[0].trace.starts_with("SqliteStore::taxonomy_exists"));
    }

    #[test]
    fn open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("content.db");
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.taxonomy_exists("category").unwrap());
        assert!(path.exists());
    }
}
