//! Import driver
//!
//! Lets the host declare its groups before configuration is resolved once.
//! The hooks built from that configuration go to the host import along with
//! the options the host understands.

use crate::config::{ConfigError, ExtraDataConfig, ImportOptions};
use crate::hooks::{ExtraTerms, Hook, HookRegistry, MetadataInjector, Profiler, SkipDefinitions};
use crate::host::{HostError, ImportHost, ImportRequest, ImportSummary};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Why a run failed.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Raised before any record is touched
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The host import's own failure, unchanged
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Build the hooks for one run from resolved configuration.
///
/// The profiler, when requested, is the first pre-record hook and the
/// last post-record hook.
pub fn build_hooks(
    config: &ExtraDataConfig,
    host: &dyn ImportHost,
    report: Box<dyn Write + Send>,
) -> HookRegistry {
    let mut hooks = HookRegistry::new();

    let profiler = config
        .profile
        .then(|| Arc::new(Profiler::activate(host.query_log(), report)));
    if let Some(profiler) = &profiler {
        hooks.register(Hook::PreRecord(profiler.clone()));
    }

    if !config.suppressed.is_empty() {
        hooks.register(Hook::DefinitionFilter(Arc::new(SkipDefinitions::new(
            config.suppressed.clone(),
        ))));
    }

    if config.touches_terms() {
        hooks.register(Hook::TermTransform(Arc::new(ExtraTerms::new(
            config.terms.clone(),
            config.suppressed.clone(),
        ))));
    }

    hooks.register(Hook::PostPersist(Arc::new(MetadataInjector::new(
        config.metadata.clone(),
    ))));

    if let Some(profiler) = profiler {
        hooks.register(Hook::PostRecord(profiler));
    }

    hooks
}

/// The import command: extra terms and metadata on top of a host import.
pub struct ImportPlus<H: ImportHost> {
    host: H,
}

impl<H: ImportHost> ImportPlus<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Run the import, writing profiling reports (if enabled) to stdout.
    pub fn run(&self, path: &Path, options: &ImportOptions) -> Result<ImportSummary, ImportError> {
        self.run_with_report(path, options, Box::new(std::io::stdout()))
    }

    /// Run the import, writing profiling reports to `report`.
    pub fn run_with_report(
        &self,
        path: &Path,
        options: &ImportOptions,
        report: Box<dyn Write + Send>,
    ) -> Result<ImportSummary, ImportError> {
        let request = ImportRequest::new(path, options.host_subset());
        self.host.prepare(&request)?;

        let config = ExtraDataConfig::resolve(options, self.host.taxonomies())?;
        let suppressed = config.suppressed.iter().collect::<Vec<_>>().join(",");
        info!(
            extra_groups = config.terms.len(),
            suppressed = %suppressed,
            extra_meta = config.metadata.len(),
            profile = config.profile,
            "configuration resolved"
        );

        let hooks = build_hooks(&config, &self.host, report);
        Ok(self.host.import(&request, &hooks)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::option;
    use crate::host::{QueryLog, Term};
    use crate::storage::{StorageResult, TaxonomyLookup};
    use std::sync::Mutex;

    impl TaxonomyLookup for RecordingHost {
        fn taxonomy_exists(&self, taxonomy: &str) -> StorageResult<bool> {
            Ok(matches!(taxonomy, "category" | "post_tag")
                || self.declared.lock().unwrap().iter().any(|d| d == taxonomy))
        }
        fn is_hierarchical(&self, taxonomy: &str) -> StorageResult<bool> {
            Ok(taxonomy == "category")
        }
        fn get_term(&self, _reference: &str, _taxonomy: &str) -> StorageResult<Option<Term>> {
            Ok(None)
        }
    }

    /// Records what the driver handed over instead of importing anything.
    #[derive(Default)]
    struct RecordingHost {
        log: QueryLog,
        calls: Mutex<Vec<(ImportRequest, Vec<String>)>>,
        /// Group the host declares while preparing
        declares: Option<&'static str>,
        declared: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ImportHost for RecordingHost {
        fn taxonomies(&self) -> &dyn TaxonomyLookup {
            self
        }
        fn query_log(&self) -> QueryLog {
            self.log.clone()
        }
        fn prepare(&self, _request: &ImportRequest) -> Result<(), HostError> {
            if let Some(name) = self.declares {
                self.declared.lock().unwrap().push(name.to_string());
            }
            Ok(())
        }
        fn import(
            &self,
            request: &ImportRequest,
            hooks: &HookRegistry,
        ) -> Result<ImportSummary, HostError> {
            let ids = hooks.ids().into_iter().map(str::to_string).collect();
            self.calls.lock().unwrap().push((request.clone(), ids));
            if self.fail {
                return Err(HostError::ExportNotFound(request.path.clone()));
            }
            Ok(ImportSummary::default())
        }
    }

    fn run(
        host: &ImportPlus<RecordingHost>,
        options: ImportOptions,
    ) -> Result<ImportSummary, ImportError> {
        host.run_with_report(Path::new("export.json"), &options, Box::new(std::io::sink()))
    }

    fn registered(host: &ImportPlus<RecordingHost>) -> Vec<String> {
        host.host().calls.lock().unwrap()[0].1.clone()
    }

    #[test]
    fn only_metadata_hook_without_options() {
        let plus = ImportPlus::new(RecordingHost::default());
        run(&plus, ImportOptions::new()).unwrap();
        assert_eq!(registered(&plus), vec!["extra_metadata"]);
    }

    #[test]
    fn extras_register_term_transform_without_suppression() {
        let plus = ImportPlus::new(RecordingHost::default());
        run(&plus, ImportOptions::new().with(option::EXTRA_TAGS, "imported")).unwrap();
        assert_eq!(registered(&plus), vec!["extra_terms", "extra_metadata"]);
    }

    #[test]
    fn suppression_registers_definition_filter() {
        let plus = ImportPlus::new(RecordingHost::default());
        run(&plus, ImportOptions::new().with_flag(option::SKIP_TAGS)).unwrap();
        assert_eq!(
            registered(&plus),
            vec!["skip_definitions", "extra_terms", "extra_metadata"]
        );
    }

    #[test]
    fn profiler_brackets_everything_and_enables_capture() {
        let plus = ImportPlus::new(RecordingHost::default());
        run(&plus, ImportOptions::new().with_flag(option::PROFILE)).unwrap();
        assert_eq!(
            registered(&plus),
            vec!["profiler", "extra_metadata", "profiler"]
        );
        assert!(plus.host().log.is_enabled());
    }

    #[test]
    fn only_host_options_are_forwarded() {
        let plus = ImportPlus::new(RecordingHost::default());
        let options = ImportOptions::new()
            .with(option::AUTHORS, "skip")
            .with(option::EXTRA_TAGS, "imported")
            .with_flag(option::PROFILE);
        run(&plus, options).unwrap();

        let calls = plus.host().calls.lock().unwrap();
        let forwarded: Vec<_> = calls[0].0.options.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(forwarded, vec!["authors"]);
        assert_eq!(calls[0].0.path, Path::new("export.json"));
    }

    #[test]
    fn configuration_error_stops_before_host_import() {
        let plus = ImportPlus::new(RecordingHost::default());
        let err = run(
            &plus,
            ImportOptions::new().with(option::EXTRA_CUSTOM_TERMS_TAXONOMY, "color"),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::Config(ConfigError::UnknownTaxonomy(_))));
        assert!(plus.host().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn groups_declared_while_preparing_are_accepted() {
        let plus = ImportPlus::new(RecordingHost {
            declares: Some("genre"),
            ..Default::default()
        });
        let options = ImportOptions::new()
            .with(option::EXTRA_CUSTOM_TERMS_TAXONOMY, "genre")
            .with(option::EXTRA_CUSTOM_TERMS, "jazz");
        run(&plus, options).unwrap();
        assert_eq!(registered(&plus), vec!["extra_terms", "extra_metadata"]);
    }

    #[test]
    fn host_failure_is_propagated_unchanged() {
        let plus = ImportPlus::new(RecordingHost {
            fail: true,
            ..Default::default()
        });
        let err = run(&plus, ImportOptions::new()).unwrap_err();
        assert!(matches!(err, ImportError::Host(HostError::ExportNotFound(_))));
        assert_eq!(err.to_string(), "export not found: export.json");
    }
}
