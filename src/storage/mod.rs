//! Content store backends
//!
//! The import writes through the `ContentStore` trait. The shipped
//! implementation is `SqliteStore`.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    ContentStore, MetadataWriter, NewRecord, OpenStore, StorageError, StorageResult, StoredRecord,
    TaxonomyLookup,
};
