//! Reference host import pipeline
//!
//! Reads export documents and writes their records into a content store,
//! one record at a time, invoking the registered hooks:
//!
//! 1. Declared groups, then term definitions per document (through
//!    definition filters)
//! 2. Per record: pre-record hooks → skip/duplicate checks → insert →
//!    post-persist hooks → term transforms → term writes → export meta →
//!    post-record hooks

use super::authors::AuthorMap;
use super::export::{export_files, read_export};
use super::trace::QueryLog;
use super::traits::{HostError, HostOptions, ImportHost, ImportRequest, ImportSummary};
use super::types::{
    canonical_group, group, ExportDocument, ExportRecord, PersistedRecord, TermDefinition,
    ATTACHMENT_TYPE, REVISION_TYPE,
};
use crate::hooks::HookRegistry;
use crate::storage::{ContentStore, NewRecord, TaxonomyLookup};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Host import over a content store.
pub struct ExportImporter<S: ContentStore> {
    store: Arc<S>,
}

impl<S: ContentStore> ExportImporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register the document's declared groups. Registration is idempotent,
    /// so a group declared by several documents is registered once.
    fn declare_taxonomies(&self, document: &ExportDocument) -> Result<(), HostError> {
        for declared in &document.taxonomies {
            let name = canonical_group(&declared.name);
            if name.is_empty() {
                warn!("taxonomy declaration without name, skipping");
                continue;
            }
            self.store.register_taxonomy(name, declared.hierarchical)?;
            debug!(group = name, hierarchical = declared.hierarchical, "taxonomy declared");
        }
        Ok(())
    }

    fn import_definitions(
        &self,
        document: &ExportDocument,
        hooks: &HookRegistry,
        summary: &mut ImportSummary,
    ) {
        let builtin = [
            (group::CATEGORY, &document.categories),
            (group::POST_TAG, &document.tags),
        ];
        for (name, definitions) in builtin {
            let kept = hooks.filter_definitions(name, definitions.clone());
            self.write_definitions(name, &kept, summary);
        }

        // Custom definitions grouped by their declared group, first-seen order
        let mut custom: Vec<(String, Vec<TermDefinition>)> = Vec::new();
        for definition in &document.terms {
            let Some(name) = definition.group.as_deref() else {
                warn!(slug = %definition.slug, "term definition without group, skipping");
                continue;
            };
            let name = canonical_group(name).to_string();
            match custom.iter_mut().find(|(g, _)| *g == name) {
                Some((_, defs)) => defs.push(definition.clone()),
                None => custom.push((name, vec![definition.clone()])),
            }
        }
        for (name, definitions) in custom {
            let kept = hooks.filter_definitions(&name, definitions);
            self.write_definitions(&name, &kept, summary);
        }
    }

    /// Definitions are written in document order; a parent must precede its children.
    fn write_definitions(
        &self,
        name: &str,
        definitions: &[TermDefinition],
        summary: &mut ImportSummary,
    ) {
        for definition in definitions {
            let parent = match definition.parent.as_deref().filter(|p| !p.is_empty()) {
                Some(parent_slug) => match self.store.get_term(parent_slug, name) {
                    Ok(found) => found.map(|t| t.id),
                    Err(e) => {
                        warn!(
                            group = name,
                            parent = parent_slug,
                            error = %e,
                            "parent lookup failed"
                        );
                        None
                    }
                },
                None => None,
            };
            if let Err(e) = self
                .store
                .ensure_term(name, &definition.slug, &definition.name, parent)
            {
                warn!(group = name, slug = %definition.slug, error = %e, "failed to import term");
                summary.failed += 1;
            }
        }
    }

    fn import_record(
        &self,
        record: ExportRecord,
        options: &HostOptions,
        authors: &AuthorMap,
        hooks: &HookRegistry,
        summary: &mut ImportSummary,
    ) {
        let record = hooks.before_record(record);

        if record.post_type == ATTACHMENT_TYPE && options.skip_attachments {
            debug!(source_id = record.id, "skipping attachment");
            summary.skipped += 1;
            hooks.after_record(record);
            return;
        }

        match self.store.find_by_source(&options.site, record.id) {
            Ok(Some(_)) => {
                info!(source_id = record.id, title = %record.title, "record already exists");
                summary.duplicates += 1;
                hooks.after_record(record);
                return;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(source_id = record.id, error = %e, "duplicate check failed");
                summary.failed += 1;
                hooks.after_record(record);
                return;
            }
        }

        let record_id = match self.persist(&record, options, authors, hooks) {
            Ok(id) => id,
            Err(e) => {
                warn!(source_id = record.id, error = %e, "failed to import record");
                summary.failed += 1;
                hooks.after_record(record);
                return;
            }
        };
        summary.imported += 1;

        let terms = hooks.transform_terms(record.terms.clone(), self.store.as_ref());
        for term in &terms {
            let written = self
                .store
                .ensure_term(term.canonical_group(), &term.slug, &term.name, None)
                .and_then(|t| self.store.relate_term(record_id, t.id));
            if let Err(e) = written {
                warn!(
                    record_id,
                    group = %term.group,
                    slug = %term.slug,
                    error = %e,
                    "failed to attach term"
                );
                summary.failed += 1;
            }
        }

        for entry in &record.meta {
            if let Err(e) = self.store.add_meta(record_id, &entry.key, &entry.value) {
                warn!(record_id, key = %entry.key, error = %e, "failed to write export meta");
                summary.failed += 1;
            }
        }

        if options.skip_image_resize && record.post_type == ATTACHMENT_TYPE {
            debug!(record_id, "image resizing skipped");
        }

        hooks.after_record(record);
    }

    /// Insert the record and fire the post-persist hooks.
    fn persist(
        &self,
        record: &ExportRecord,
        options: &HostOptions,
        authors: &AuthorMap,
        hooks: &HookRegistry,
    ) -> Result<i64, HostError> {
        let author_id = authors.resolve(record.author.as_deref(), self.store.as_ref())?;

        let revision_of = match record.parent {
            Some(parent) if record.post_type == REVISION_TYPE => {
                self.store.find_by_source(&options.site, parent)?
            }
            _ => None,
        };

        let record_id = self.store.insert_record(&NewRecord {
            source_id: record.id,
            site: options.site.clone(),
            post_type: record.post_type.clone(),
            title: record.title.clone(),
            content: record.content.clone(),
            status: record.status.clone(),
            author_id,
            date: record.date,
            revision_of,
        })?;
        debug!(record_id, source_id = record.id, "record inserted");

        let persisted = PersistedRecord {
            id: record_id,
            source_id: record.id,
            post_type: record.post_type.clone(),
            title: record.title.clone(),
            revision_of,
        };
        hooks.after_persist(record_id, &persisted, self.store.as_ref());
        Ok(record_id)
    }
}

impl<S: ContentStore + 'static> ImportHost for ExportImporter<S> {
    fn taxonomies(&self) -> &dyn TaxonomyLookup {
        self.store.as_ref()
    }

    fn query_log(&self) -> QueryLog {
        self.store.query_log()
    }

    fn prepare(&self, request: &ImportRequest) -> Result<(), HostError> {
        for path in export_files(&request.path)? {
            self.declare_taxonomies(&read_export(&path)?)?;
        }
        Ok(())
    }

    fn import(
        &self,
        request: &ImportRequest,
        hooks: &HookRegistry,
    ) -> Result<ImportSummary, HostError> {
        let options = HostOptions::from_options(&request.options)?;
        let files = export_files(&request.path)?;
        let mut summary = ImportSummary::default();

        for path in files {
            info!(path = %path.display(), "importing export file");
            let document = read_export(&path)?;
            let authors = AuthorMap::prepare(&options.authors, &document.posts)?;
            self.declare_taxonomies(&document)?;
            self.import_definitions(&document, hooks, &mut summary);

            for record in document.posts {
                self.import_record(record, &options, &authors, hooks, &mut summary);
            }
            summary.files += 1;
        }

        info!(
            imported = summary.imported,
            duplicates = summary.duplicates,
            skipped = summary.skipped,
            failed = summary.failed,
            "import finished"
        );
        Ok(summary)
    }
}
