//! Host import contract
//!
//! The host owns the export reading and the per-record loop. This crate
//! extends it only through the hooks passed to `ImportHost::import`.

use super::trace::QueryLog;
use crate::config::{option, ImportOptions};
use crate::hooks::HookRegistry;
use crate::storage::{StorageError, TaxonomyLookup};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal failures of the host import.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("export not found: {}", .0.display())]
    ExportNotFound(PathBuf),

    #[error("no export files found in {}", .0.display())]
    EmptyExportDirectory(PathBuf),

    #[error("invalid export {}: {source}", .path.display())]
    InvalidExport {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value '{value}' for --{option}")]
    InvalidOption { option: String, value: String },

    #[error("author mapping file {} created; edit it and run the import again", .0.display())]
    AuthorMappingCreated(PathBuf),

    #[error("invalid author mapping {}: {source}", .path.display())]
    AuthorMapping {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How export authors are mapped onto store authors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorMode {
    /// Create any author that doesn't exist yet
    Create,
    /// Read old_user_login,new_user_login pairs from a CSV file
    Mapping(PathBuf),
    /// Import records without an author
    Skip,
}

impl AuthorMode {
    pub fn parse(value: &str) -> Self {
        match value {
            "create" => Self::Create,
            "skip" => Self::Skip,
            path => Self::Mapping(PathBuf::from(path)),
        }
    }
}

/// The option subset the host itself understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOptions {
    pub authors: AuthorMode,
    pub skip_attachments: bool,
    pub skip_image_resize: bool,
    pub site: String,
}

/// Site identifier used when `--url` is absent.
pub const DEFAULT_SITE: &str = "default";

impl HostOptions {
    /// Interpret the forwarded options. Unknown `--skip` entries are ignored.
    pub fn from_options(options: &ImportOptions) -> Result<Self, HostError> {
        let authors = match options.value(option::AUTHORS) {
            Some(value) => AuthorMode::parse(value),
            None => AuthorMode::Create,
        };

        let mut skip_attachments = false;
        let mut skip_image_resize = false;
        for entry in options.list(option::SKIP) {
            match entry.as_str() {
                "attachment" => skip_attachments = true,
                "image_resize" => skip_image_resize = true,
                other => tracing::warn!(value = other, "ignoring unknown --skip entry"),
            }
        }

        let site = match options.value(option::URL) {
            Some(url) if url.trim().is_empty() => {
                return Err(HostError::InvalidOption {
                    option: option::URL.to_string(),
                    value: url.to_string(),
                })
            }
            Some(url) => url.trim().to_string(),
            None => DEFAULT_SITE.to_string(),
        };

        Ok(Self {
            authors,
            skip_attachments,
            skip_image_resize,
            site,
        })
    }
}

/// A programmatic import invocation: the export path plus host options.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub path: PathBuf,
    pub options: ImportOptions,
}

impl ImportRequest {
    pub fn new(path: impl AsRef<Path>, options: ImportOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
        }
    }
}

/// What an import run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Export files read
    pub files: usize,
    /// Records newly written to the store
    pub imported: usize,
    /// Records already present from an earlier run
    pub duplicates: usize,
    /// Records skipped by `--skip`
    pub skipped: usize,
    /// Records or writes that failed without aborting the run
    pub failed: usize,
}

/// The host import pipeline, as seen by the driver.
pub trait ImportHost {
    /// Group and term lookups used while resolving configuration
    fn taxonomies(&self) -> &dyn TaxonomyLookup;

    /// The trace collector the host's store reports into
    fn query_log(&self) -> QueryLog;

    /// Make the groups the request's exports declare known to
    /// `taxonomies()`. Runs before configuration is resolved.
    fn prepare(&self, _request: &ImportRequest) -> Result<(), HostError> {
        Ok(())
    }

    /// Run the import, invoking the given hooks once per record.
    fn import(
        &self,
        request: &ImportRequest,
        hooks: &HookRegistry,
    ) -> Result<ImportSummary, HostError>;
}
