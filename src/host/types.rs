//! Record and term types exchanged between the host pipeline and its hooks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known classification groups.
pub mod group {
    pub const CATEGORY: &str = "category";
    pub const POST_TAG: &str = "post_tag";
    pub const POST_FORMAT: &str = "post_format";

    /// Legacy alias some exports use for `post_tag`.
    pub const TAG_ALIAS: &str = "tag";
}

/// Post type marking a snapshot of another record.
pub const REVISION_TYPE: &str = "revision";

/// Post type of media records.
pub const ATTACHMENT_TYPE: &str = "attachment";

/// Normalize a group name: the legacy `tag` alias maps to `post_tag`.
pub fn canonical_group(name: &str) -> &str {
    if name == group::TAG_ALIAS {
        group::POST_TAG
    } else {
        name
    }
}

/// One entry of the term list the host proposes to attach to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedTerm {
    /// Classification group (exports may use the `tag` alias)
    #[serde(alias = "domain")]
    pub group: String,
    /// Stable identifier of the term within its group
    pub slug: String,
    /// Human label
    pub name: String,
}

impl ProposedTerm {
    pub fn new(group: impl Into<String>, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            slug: slug.into(),
            name: name.into(),
        }
    }

    /// A term whose name is its slug, as created when nothing existing matched.
    pub fn literal(group: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            group: group.into(),
            name: slug.clone(),
            slug,
        }
    }

    /// The group name after alias normalization.
    pub fn canonical_group(&self) -> &str {
        canonical_group(&self.group)
    }
}

/// A term stored in the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub id: i64,
    pub group: String,
    pub slug: String,
    pub name: String,
    pub parent: Option<i64>,
}

/// A term declared at the top of an export document, independent of any record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDefinition {
    pub slug: String,
    pub name: String,
    /// Slug of the parent term (hierarchical groups only)
    #[serde(default)]
    pub parent: Option<String>,
    /// Group for custom-term definitions; implied for categories and tags
    #[serde(default)]
    pub group: Option<String>,
}

/// A metadata key/value pair carried by an export record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
}

/// One importable content item as read from an export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Identifier of the record in the exporting site
    pub id: i64,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Source id of the record this one is a revision of
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub terms: Vec<ProposedTerm>,
    #[serde(default)]
    pub meta: Vec<MetaEntry>,
}

fn default_post_type() -> String {
    "post".to_string()
}

fn default_status() -> String {
    "publish".to_string()
}

/// A classification group the export uses beyond the builtins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyDeclaration {
    pub name: String,
    #[serde(default)]
    pub hierarchical: bool,
}

/// A full export document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Groups registered with the store before anything else is read
    #[serde(default)]
    pub taxonomies: Vec<TaxonomyDeclaration>,
    #[serde(default)]
    pub categories: Vec<TermDefinition>,
    #[serde(default)]
    pub tags: Vec<TermDefinition>,
    /// Definitions for any other group; each must name its group
    #[serde(default)]
    pub terms: Vec<TermDefinition>,
    #[serde(default)]
    pub posts: Vec<ExportRecord>,
}

/// The payload handed to post-persist hooks for a durably written record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub id: i64,
    pub source_id: i64,
    pub post_type: String,
    pub title: String,
    /// Store id of the record this one is a snapshot of
    pub revision_of: Option<i64>,
}

impl PersistedRecord {
    /// True when this record is a revision of another record rather than a primary one.
    pub fn is_revision(&self) -> bool {
        self.post_type == REVISION_TYPE
    }
}
