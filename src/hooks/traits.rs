//! Hook traits: the extension points the host invokes per record
//!
//! Hooks are plain objects handed to the host in a `HookRegistry` for a
//! single run. Whatever a hook needs from the store is passed in at call
//! time, never reached through global state.

use crate::host::{ExportRecord, PersistedRecord, ProposedTerm, TermDefinition};
use crate::storage::{MetadataWriter, TaxonomyLookup};
use std::sync::Arc;

/// Rewrites the term list proposed for one record.
pub trait TermTransform: Send + Sync {
    fn id(&self) -> &str;

    /// Return the (possibly modified) term list to attach.
    fn transform(
        &self,
        terms: Vec<ProposedTerm>,
        taxonomies: &dyn TaxonomyLookup,
    ) -> Vec<ProposedTerm>;
}

/// Filters the term definitions declared at the top of an export document.
pub trait DefinitionFilter: Send + Sync {
    fn id(&self) -> &str;

    /// `group` is the canonical group the definitions belong to.
    fn filter(&self, group: &str, definitions: Vec<TermDefinition>) -> Vec<TermDefinition>;
}

/// Fired once per record after it has been durably written.
pub trait PostPersistHook: Send + Sync {
    fn id(&self) -> &str;

    fn after_persist(&self, record_id: i64, record: &PersistedRecord, store: &dyn MetadataWriter);
}

/// Runs first in a record's window, on the raw export record.
pub trait PreRecordHook: Send + Sync {
    fn id(&self) -> &str;

    fn before_record(&self, record: ExportRecord) -> ExportRecord;
}

/// Runs last in a record's window, on the fully processed record.
pub trait PostRecordHook: Send + Sync {
    fn id(&self) -> &str;

    fn after_record(&self, record: ExportRecord) -> ExportRecord;
}

/// One registration.
#[derive(Clone)]
pub enum Hook {
    TermTransform(Arc<dyn TermTransform>),
    DefinitionFilter(Arc<dyn DefinitionFilter>),
    PostPersist(Arc<dyn PostPersistHook>),
    PreRecord(Arc<dyn PreRecordHook>),
    PostRecord(Arc<dyn PostRecordHook>),
}

impl Hook {
    pub fn id(&self) -> &str {
        match self {
            Self::TermTransform(h) => h.id(),
            Self::DefinitionFilter(h) => h.id(),
            Self::PostPersist(h) => h.id(),
            Self::PreRecord(h) => h.id(),
            Self::PostRecord(h) => h.id(),
        }
    }
}

/// The hooks for one import run, grouped by extension point.
///
/// Within each extension point hooks run in registration order.
#[derive(Clone, Default)]
pub struct HookRegistry {
    term_transforms: Vec<Arc<dyn TermTransform>>,
    definition_filters: Vec<Arc<dyn DefinitionFilter>>,
    post_persist: Vec<Arc<dyn PostPersistHook>>,
    pre_record: Vec<Arc<dyn PreRecordHook>>,
    post_record: Vec<Arc<dyn PostRecordHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Hook) {
        tracing::debug!(hook = hook.id(), "registering hook");
        match hook {
            Hook::TermTransform(h) => self.term_transforms.push(h),
            Hook::DefinitionFilter(h) => self.definition_filters.push(h),
            Hook::PostPersist(h) => self.post_persist.push(h),
            Hook::PreRecord(h) => self.pre_record.push(h),
            Hook::PostRecord(h) => self.post_record.push(h),
        }
    }

    /// Builder-style `register`.
    pub fn with(mut self, hook: Hook) -> Self {
        self.register(hook);
        self
    }

    pub fn transform_terms(
        &self,
        terms: Vec<ProposedTerm>,
        taxonomies: &dyn TaxonomyLookup,
    ) -> Vec<ProposedTerm> {
        self.term_transforms
            .iter()
            .fold(terms, |terms, hook| hook.transform(terms, taxonomies))
    }

    pub fn filter_definitions(
        &self,
        group: &str,
        definitions: Vec<TermDefinition>,
    ) -> Vec<TermDefinition> {
        self.definition_filters
            .iter()
            .fold(definitions, |defs, hook| hook.filter(group, defs))
    }

    pub fn after_persist(
        &self,
        record_id: i64,
        record: &PersistedRecord,
        store: &dyn MetadataWriter,
    ) {
        for hook in &self.post_persist {
            hook.after_persist(record_id, record, store);
        }
    }

    pub fn before_record(&self, record: ExportRecord) -> ExportRecord {
        self.pre_record
            .iter()
            .fold(record, |record, hook| hook.before_record(record))
    }

    pub fn after_record(&self, record: ExportRecord) -> ExportRecord {
        self.post_record
            .iter()
            .fold(record, |record, hook| hook.after_record(record))
    }

    /// Ids of every registered hook, grouped by extension point.
    pub fn ids(&self) -> Vec<&str> {
        self.pre_record
            .iter()
            .map(|h| h.id())
            .chain(self.definition_filters.iter().map(|h| h.id()))
            .chain(self.term_transforms.iter().map(|h| h.id()))
            .chain(self.post_persist.iter().map(|h| h.id()))
            .chain(self.post_record.iter().map(|h| h.id()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}
