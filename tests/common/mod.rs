//! Shared fixtures for import integration tests
//!
//! Builds an in-memory store, writes export documents to a temp directory,
//! and captures profiler output.

use import_plus::{ExportImporter, ImportPlus, OpenStore, SqliteStore};
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A store, an importer over it, and a directory for export files.
pub struct Fixture {
    pub store: Arc<SqliteStore>,
    pub plus: ImportPlus<ExportImporter<SqliteStore>>,
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
        Self {
            plus: ImportPlus::new(ExportImporter::new(store.clone())),
            store,
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    /// Write an export document and return its path.
    pub fn export(&self, name: &str, document: Value) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();
        path
    }

    /// Store id of an imported record by its export id.
    pub fn record_id(&self, source_id: i64) -> i64 {
        use import_plus::ContentStore;
        self.store
            .find_by_source("default", source_id)
            .unwrap()
            .unwrap_or_else(|| panic!("record {} not imported", source_id))
    }

    /// (group, slug) pairs attached to a record.
    pub fn terms(&self, source_id: i64) -> Vec<(String, String)> {
        use import_plus::ContentStore;
        self.store
            .terms_for(self.record_id(source_id))
            .unwrap()
            .into_iter()
            .map(|t| (t.group, t.slug))
            .collect()
    }

    pub fn meta(&self, source_id: i64) -> Vec<(String, String)> {
        use import_plus::ContentStore;
        self.store.meta_for(self.record_id(source_id)).unwrap()
    }
}

/// A two-post export with categories and tags on each post, plus one revision.
pub fn sample_export() -> Value {
    json!({
        "categories": [
            {"slug": "news", "name": "News"},
            {"slug": "local", "name": "Local", "parent": "news"}
        ],
        "tags": [
            {"slug": "rust", "name": "Rust"}
        ],
        "posts": [
            {
                "id": 101,
                "title": "First",
                "author": "alice",
                "terms": [
                    {"domain": "category", "slug": "news", "name": "News"},
                    {"domain": "tag", "slug": "rust", "name": "Rust"}
                ],
                "meta": [{"key": "views", "value": "10"}]
            },
            {
                "id": 102,
                "title": "Second",
                "post_type": "page",
                "terms": [
                    {"domain": "category", "slug": "local", "name": "Local"},
                    {"domain": "post_tag", "slug": "cli", "name": "CLI"}
                ]
            },
            {
                "id": 103,
                "title": "First",
                "post_type": "revision",
                "parent": 101
            }
        ]
    })
}

/// Clonable in-memory writer for profiler output.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
