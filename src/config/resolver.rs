//! Configuration resolution
//!
//! Turns the flat option mapping into the lookup tables the hooks read:
//! extra terms per group, suppressed groups, extra metadata, and the
//! profiling switch. Built once per run and never mutated afterwards.

use super::options::{option, ImportOptions};
use crate::host::group;
use crate::storage::{StorageError, TaxonomyLookup};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

/// Errors that abort a run before any record is imported.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown custom taxonomy '{0}'")]
    UnknownTaxonomy(String),

    #[error("taxonomy lookup failed: {0}")]
    Lookup(#[from] StorageError),
}

/// Extra term references per classification group, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermAssignment {
    groups: Vec<(String, Vec<String>)>,
}

impl TermAssignment {
    /// Set a group's references. A group configured twice keeps its first
    /// position and its last list.
    fn assign(&mut self, group: &str, references: Vec<String>) {
        match self.groups.iter_mut().find(|(g, _)| g == group) {
            Some((_, existing)) => *existing = references,
            None => self.groups.push((group.to_string(), references)),
        }
    }

    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(g, _)| g == group)
            .map(|(_, refs)| refs.as_slice())
    }

    pub fn contains(&self, group: &str) -> bool {
        self.get(group).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(g, refs)| (g.as_str(), refs.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}

/// Classification groups whose host-proposed terms are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionSet {
    groups: BTreeSet<String>,
}

impl SuppressionSet {
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SuppressionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Metadata key → value pairs written to every imported record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataAssignment {
    entries: Vec<(String, String)>,
}

impl MetadataAssignment {
    /// Pair keys and values by position.
    ///
    /// Values beyond the last key are ignored. If any key lacks a non-empty
    /// value the whole table is empty. A repeated key keeps its last value.
    pub fn pair(keys: &str, values: &str) -> Self {
        let keys: Vec<&str> = keys.split(',').map(str::trim).collect();
        let values: Vec<&str> = values.split(',').map(str::trim).collect();

        let mut table = Self::default();
        for (i, key) in keys.iter().enumerate() {
            let value = match values.get(i) {
                Some(v) if !v.is_empty() => *v,
                _ => {
                    warn!(
                        key = *key,
                        position = i,
                        "metadata key has no value, ignoring all extra metadata"
                    );
                    return Self::default();
                }
            };
            if key.is_empty() {
                warn!(position = i, "skipping blank metadata key");
                continue;
            }
            table.insert(key, value);
        }

        if values.len() > keys.len() {
            warn!(
                extra = values.len() - keys.len(),
                "more metadata values than keys, extra values ignored"
            );
        }

        table
    }

    fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Everything the hooks need, resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraDataConfig {
    pub terms: TermAssignment,
    pub suppressed: SuppressionSet,
    pub metadata: MetadataAssignment,
    pub profile: bool,
}

impl ExtraDataConfig {
    /// Resolve the configuration from parsed options.
    ///
    /// Fails only when `--extra-custom-terms-taxonomy` names a group the
    /// store does not know.
    pub fn resolve(
        options: &ImportOptions,
        taxonomies: &dyn TaxonomyLookup,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            terms: resolve_terms(options, taxonomies)?,
            suppressed: resolve_suppression(options),
            metadata: resolve_metadata(options),
            profile: options.flag(option::PROFILE),
        })
    }

    /// True when the term transform has anything to do.
    pub fn touches_terms(&self) -> bool {
        !self.terms.is_empty() || !self.suppressed.is_empty()
    }
}

fn resolve_terms(
    options: &ImportOptions,
    taxonomies: &dyn TaxonomyLookup,
) -> Result<TermAssignment, ConfigError> {
    let mut terms = TermAssignment::default();

    let categories = options.list(option::EXTRA_CATEGORIES);
    if !categories.is_empty() {
        terms.assign(group::CATEGORY, categories);
    }

    let tags = options.list(option::EXTRA_TAGS);
    if !tags.is_empty() {
        terms.assign(group::POST_TAG, tags);
    }

    if let Some(custom) = options.value(option::EXTRA_CUSTOM_TERMS_TAXONOMY) {
        if !taxonomies.taxonomy_exists(custom)? {
            return Err(ConfigError::UnknownTaxonomy(custom.to_string()));
        }
        let custom_terms = options.list(option::EXTRA_CUSTOM_TERMS);
        if !custom_terms.is_empty() {
            terms.assign(custom, custom_terms);
        }
    } else if options.value(option::EXTRA_CUSTOM_TERMS).is_some() {
        warn!("--extra-custom-terms ignored without --extra-custom-terms-taxonomy");
    }

    Ok(terms)
}

fn resolve_suppression(options: &ImportOptions) -> SuppressionSet {
    [
        (option::SKIP_CATEGORIES, group::CATEGORY),
        (option::SKIP_TAGS, group::POST_TAG),
    ]
    .into_iter()
    .filter(|(flag, _)| options.flag(flag))
    .map(|(_, name)| name)
    .collect()
}

fn resolve_metadata(options: &ImportOptions) -> MetadataAssignment {
    match (
        options.value(option::EXTRA_POST_META_KEYS),
        options.value(option::EXTRA_POST_META_VALUES),
    ) {
        (Some(keys), Some(values)) => MetadataAssignment::pair(keys, values),
        _ => MetadataAssignment::default(),
    }
}
