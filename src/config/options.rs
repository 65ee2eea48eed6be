//! Flat command-line option mapping

use std::collections::BTreeMap;

/// Recognized option names, as spelled on the command line without `--`.
pub mod option {
    pub const AUTHORS: &str = "authors";
    pub const SKIP: &str = "skip";
    pub const URL: &str = "url";
    pub const EXTRA_CATEGORIES: &str = "extra-categories";
    pub const EXTRA_TAGS: &str = "extra-tags";
    pub const EXTRA_CUSTOM_TERMS_TAXONOMY: &str = "extra-custom-terms-taxonomy";
    pub const EXTRA_CUSTOM_TERMS: &str = "extra-custom-terms";
    pub const EXTRA_POST_META_KEYS: &str = "extra-post-meta-keys";
    pub const EXTRA_POST_META_VALUES: &str = "extra-post-meta-values";
    pub const SKIP_CATEGORIES: &str = "skip-categories";
    pub const SKIP_TAGS: &str = "skip-tags";
    pub const PROFILE: &str = "profile";

    /// Options the host import itself accepts.
    pub const HOST_OPTIONS: [&str; 3] = [AUTHORS, SKIP, URL];
}

/// Option name → string value, as produced by command-line parsing.
///
/// Flags are stored with an empty value. An absent key means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    values: BTreeMap<String, String>,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style flag.
    pub fn with_flag(self, key: impl Into<String>) -> Self {
        self.with(key, "")
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// The option's value, or `None` when absent or empty.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// True when the option is present at all (flags).
    pub fn flag(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Split a comma-separated option into trimmed, non-blank entries.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.value(key).map(split_list).unwrap_or_default()
    }

    /// The options the host import recognizes; everything else stays here.
    pub fn host_subset(&self) -> ImportOptions {
        let values = self
            .values
            .iter()
            .filter(|(k, _)| option::HOST_OPTIONS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        ImportOptions { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ImportOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = ImportOptions::new();
        for (k, v) in iter {
            options.insert(k, v);
        }
        options
    }
}

/// Split on commas, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
