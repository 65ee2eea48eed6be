//! Import Plus: extra data for content export imports
//!
//! Extends a host import pipeline with per-record hooks that attach extra
//! classification terms and metadata to every imported record, suppress
//! whole classification groups, and optionally profile the store calls
//! made for each record.
//!
//! # Core Concepts
//!
//! - **Configuration**: command-line options resolved once into term,
//!   suppression and metadata tables
//! - **Hooks**: typed callbacks handed to the host for a single run
//! - **Host**: the import pipeline that reads exports and writes records
//!
//! # Example
//!
//! ```
//! use import_plus::{ExportImporter, ImportOptions, ImportPlus, OpenStore, SqliteStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::open_in_memory().unwrap());
//! let plus = ImportPlus::new(ExportImporter::new(store));
//! let options = ImportOptions::new().with("extra-tags", "imported");
//! // plus.run(Path::new("export.json"), &options)
//! # let _ = (plus, options);
//! ```

pub mod config;
pub mod hooks;
pub mod host;
mod import;
pub mod storage;

pub use config::{ConfigError, ExtraDataConfig, ImportOptions};
pub use hooks::{Hook, HookRegistry};
pub use host::{ExportImporter, HostError, ImportHost, ImportRequest, ImportSummary, QueryLog};
pub use import::{build_hooks, ImportError, ImportPlus};
pub use storage::{ContentStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
