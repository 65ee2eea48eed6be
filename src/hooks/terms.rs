//! Extra-terms hook
//!
//! Drops host-proposed terms in suppressed groups, then appends the
//! configured extras. Extras are never suppressed: a group that is both
//! skipped and configured ends up with exactly its configured extras.
//!
//! No deduplication against host-proposed terms; the store's term
//! creation is idempotent.

use super::traits::{DefinitionFilter, TermTransform};
use crate::config::{SuppressionSet, TermAssignment};
use crate::host::{canonical_group, ProposedTerm, TermDefinition};
use crate::storage::TaxonomyLookup;
use tracing::{debug, warn};

/// Term transform that filters suppressed groups and injects extras.
pub struct ExtraTerms {
    terms: TermAssignment,
    suppressed: SuppressionSet,
}

impl ExtraTerms {
    pub fn new(terms: TermAssignment, suppressed: SuppressionSet) -> Self {
        Self { terms, suppressed }
    }

    /// Resolve one configured reference to the slug to attach.
    ///
    /// In hierarchical groups an existing term's slug wins; anything that
    /// doesn't resolve (including lookup errors) is used literally.
    fn resolve_slug(
        &self,
        group: &str,
        reference: &str,
        taxonomies: &dyn TaxonomyLookup,
    ) -> String {
        let hierarchical = match taxonomies.is_hierarchical(group) {
            Ok(h) => h,
            Err(e) => {
                warn!(group, error = %e, "hierarchy check failed, using reference literally");
                return reference.to_string();
            }
        };
        if !hierarchical {
            return reference.to_string();
        }

        match taxonomies.get_term(reference, group) {
            Ok(Some(term)) => term.slug,
            Ok(None) => {
                debug!(group, reference, "no existing term, creating from reference");
                reference.to_string()
            }
            Err(e) => {
                warn!(
                    group,
                    reference,
                    error = %e,
                    "term lookup failed, using reference literally"
                );
                reference.to_string()
            }
        }
    }
}

impl TermTransform for ExtraTerms {
    fn id(&self) -> &str {
        "extra_terms"
    }

    fn transform(
        &self,
        terms: Vec<ProposedTerm>,
        taxonomies: &dyn TaxonomyLookup,
    ) -> Vec<ProposedTerm> {
        let mut out: Vec<ProposedTerm> = terms
            .into_iter()
            .filter(|term| !self.suppressed.contains(term.canonical_group()))
            .collect();

        for (group, references) in self.terms.iter() {
            let output_group = canonical_group(group);
            for reference in references {
                let slug = self.resolve_slug(group, reference, taxonomies);
                out.push(ProposedTerm::literal(output_group, slug));
            }
        }

        out
    }
}

/// Drops the export's top-level term definitions for suppressed groups.
pub struct SkipDefinitions {
    suppressed: SuppressionSet,
}

impl SkipDefinitions {
    pub fn new(suppressed: SuppressionSet) -> Self {
        Self { suppressed }
    }
}

impl DefinitionFilter for SkipDefinitions {
    fn id(&self) -> &str {
        "skip_definitions"
    }

    fn filter(&self, group: &str, definitions: Vec<TermDefinition>) -> Vec<TermDefinition> {
        if self.suppressed.contains(canonical_group(group)) {
            debug!(group, dropped = definitions.len(), "skipping term definitions");
            Vec::new()
        } else {
            definitions
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{option, ExtraDataConfig, ImportOptions};
    use crate::host::Term;
    use crate::storage::{StorageError, StorageResult};

    /// `category` is hierarchical with term 5 = "featured"; `post_tag` is flat;
    /// `broken` fails every lookup.
    struct Fixture;

    impl TaxonomyLookup for Fixture {
        fn taxonomy_exists(&self, taxonomy: &str) -> StorageResult<bool> {
            Ok(matches!(taxonomy, "category" | "post_tag" | "broken"))
        }
        fn is_hierarchical(&self, taxonomy: &str) -> StorageResult<bool> {
            Ok(matches!(taxonomy, "category" | "broken"))
        }
        fn get_term(&self, reference: &str, taxonomy: &str) -> StorageResult<Option<Term>> {
            match (taxonomy, reference) {
                ("broken", _) => Err(StorageError::TaxonomyNotFound("broken".to_string())),
                ("category", "5") => Ok(Some(Term {
                    id: 5,
                    group: "category".to_string(),
                    slug: "featured".to_string(),
                    name: "Featured".to_string(),
                    parent: None,
                })),
                _ => Ok(None),
            }
        }
    }

    fn hook(options: ImportOptions) -> ExtraTerms {
        let config = ExtraDataConfig::resolve(&options, &Fixture).unwrap();
        ExtraTerms::new(config.terms, config.suppressed)
    }

    fn proposed() -> Vec<ProposedTerm> {
        vec![
            ProposedTerm::new("category", "news", "News"),
            ProposedTerm::new("tag", "rust", "Rust"),
            ProposedTerm::new("post_tag", "cli", "CLI"),
            ProposedTerm::new("post_format", "aside", "Aside"),
        ]
    }

    fn pairs(terms: &[ProposedTerm]) -> Vec<(&str, &str)> {
        terms.iter().map(|t| (t.group.as_str(), t.slug.as_str())).collect()
    }

    #[test]
    fn nothing_configured_passes_through() {
        let out = hook(ImportOptions::new()).transform(proposed(), &Fixture);
        assert_eq!(out, proposed());
    }

    #[test]
    fn extra_tags_are_appended_literally() {
        let out = hook(ImportOptions::new().with(option::EXTRA_TAGS, "imported"))
            .transform(proposed(), &Fixture);
        assert_eq!(out.len(), 5);
        assert_eq!(out.last().unwrap(), &ProposedTerm::literal("post_tag", "imported"));
    }

    #[test]
    fn suppressed_tags_include_alias_group() {
        let out = hook(ImportOptions::new().with_flag(option::SKIP_TAGS))
            .transform(proposed(), &Fixture);
        assert_eq!(pairs(&out), vec![("category", "news"), ("post_format", "aside")]);
    }

    #[test]
    fn suppressed_group_keeps_configured_extras() {
        let out = hook(
            ImportOptions::new()
                .with_flag(option::SKIP_CATEGORIES)
                .with(option::EXTRA_CATEGORIES, "5"),
        )
        .transform(proposed(), &Fixture);

        let categories: Vec<_> = out.iter().filter(|t| t.group == "category").collect();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].slug, "featured");
        assert_eq!(categories[0].name, "featured");
    }

    #[test]
    fn unresolved_hierarchical_reference_is_literal() {
        let out = hook(ImportOptions::new().with(option::EXTRA_CATEGORIES, "99,5"))
            .transform(Vec::new(), &Fixture);
        assert_eq!(pairs(&out), vec![("category", "99"), ("category", "featured")]);
    }

    #[test]
    fn flat_group_never_looks_up_terms() {
        let out = hook(ImportOptions::new().with(option::EXTRA_TAGS, "5"))
            .transform(Vec::new(), &Fixture);
        assert_eq!(pairs(&out), vec![("post_tag", "5")]);
    }

    #[test]
    fn lookup_failure_falls_back_to_literal() {
        let out = hook(
            ImportOptions::new()
                .with(option::EXTRA_CUSTOM_TERMS_TAXONOMY, "broken")
                .with(option::EXTRA_CUSTOM_TERMS, "x"),
        )
        .transform(Vec::new(), &Fixture);
        assert_eq!(pairs(&out), vec![("broken", "x")]);
    }

    #[test]
    fn extras_follow_host_terms_in_configuration_order() {
        let mut input = proposed();
        input.reverse();
        let out = hook(
            ImportOptions::new()
                .with(option::EXTRA_TAGS, "b,a")
                .with(option::EXTRA_CATEGORIES, "5"),
        )
        .transform(input.clone(), &Fixture);

        assert_eq!(&out[..input.len()], &input[..]);
        assert_eq!(
            pairs(&out[input.len()..]),
            vec![("category", "featured"), ("post_tag", "b"), ("post_tag", "a")]
        );
    }

    #[test]
    fn duplicates_are_not_removed() {
        let out = hook(ImportOptions::new().with(option::EXTRA_TAGS, "cli"))
            .transform(proposed(), &Fixture);
        let cli = out.iter().filter(|t| t.slug == "cli").count();
        assert_eq!(cli, 2);
    }

    #[test]
    fn skip_definitions_only_touches_suppressed_groups() {
        let filter = SkipDefinitions::new(["category"].into_iter().collect());
        let defs = vec![TermDefinition {
            slug: "news".to_string(),
            name: "News".to_string(),
            parent: None,
            group: None,
        }];
        assert!(filter.filter("category", defs.clone()).is_empty());
        assert_eq!(filter.filter("post_tag", defs.clone()), defs);
    }
}
