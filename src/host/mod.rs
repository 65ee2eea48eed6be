//! Host import pipeline
//!
//! The contract the driver delegates to (`ImportHost`), the record and term
//! types that flow through hooks, the query trace collector, and
//! `ExportImporter`, a small host that imports JSON export documents into a
//! `ContentStore`.

mod authors;
mod export;
mod pipeline;
mod trace;
mod traits;
mod types;

pub use authors::AuthorMap;
pub use export::{export_files, read_export};
pub use pipeline::ExportImporter;
pub use trace::{QueryLog, QueryTrace};
pub use traits::{
    AuthorMode, HostError, HostOptions, ImportHost, ImportRequest, ImportSummary, DEFAULT_SITE,
};
pub use types::{
    canonical_group, group, ExportDocument, ExportRecord, MetaEntry, PersistedRecord,
    ProposedTerm, TaxonomyDeclaration, Term, TermDefinition, ATTACHMENT_TYPE, REVISION_TYPE,
};
