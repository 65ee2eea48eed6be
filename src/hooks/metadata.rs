//! Extra-metadata hook

use super::traits::PostPersistHook;
use crate::config::MetadataAssignment;
use crate::host::PersistedRecord;
use crate::storage::MetadataWriter;
use tracing::{info, warn};

/// Writes every configured metadata pair to each persisted primary record.
///
/// Revisions are skipped. Writes always append; a failed write is logged
/// and the remaining pairs are still written.
pub struct MetadataInjector {
    metadata: MetadataAssignment,
}

impl MetadataInjector {
    pub fn new(metadata: MetadataAssignment) -> Self {
        Self { metadata }
    }
}

impl PostPersistHook for MetadataInjector {
    fn id(&self) -> &str {
        "extra_metadata"
    }

    fn after_persist(&self, record_id: i64, record: &PersistedRecord, store: &dyn MetadataWriter) {
        if record.is_revision() {
            return;
        }

        for (key, value) in self.metadata.iter() {
            info!(record_id, "-- PLUS: Setting post meta {}", key);
            if let Err(e) = store.add_meta(record_id, key, value) {
                warn!(record_id, key, error = %e, "failed to write extra metadata");
            }
        }
    }
}
