//! Import hooks
//!
//! Typed callbacks the host invokes at its extension points, and the
//! components built on them: extra terms, extra metadata, and the query
//! profiler.

mod metadata;
mod profiler;
mod terms;
mod traits;

pub use metadata::MetadataInjector;
pub use profiler::{render_report, Profiler, ProfilerState};
pub use terms::{ExtraTerms, SkipDefinitions};
pub use traits::{
    DefinitionFilter, Hook, HookRegistry, PostPersistHook, PostRecordHook, PreRecordHook,
    TermTransform,
};
