//! Import Plus CLI: import an export with extra terms and metadata.
//!
//! Usage:
//!   import-plus <file> [--extra-tags=a,b] [--extra-post-meta-keys=k --extra-post-meta-values=v]
//!               [--skip-categories] [--skip-tags] [--profile] [--db path]

use clap::Parser;
use import_plus::config::option;
use import_plus::{ExportImporter, ImportOptions, ImportPlus, OpenStore, SqliteStore};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Import an export file, associating extra terms and metadata to each imported record.
///
/// Categories and tags proposed by the export can be skipped; extras set here
/// are always attached.
#[derive(Parser, Debug)]
#[command(name = "import-plus", version)]
struct Cli {
    /// Path to an export file. Directories are also accepted.
    file: PathBuf,

    /// Author mapping: 'create', 'skip', or a path to an old_user_login,new_user_login CSV
    #[arg(long)]
    authors: Option<String>,

    /// Skip importing specific data: 'attachment' and/or 'image_resize'
    #[arg(long)]
    skip: Option<String>,

    /// Target site identifier
    #[arg(long)]
    url: Option<String>,

    /// Comma-separated category IDs to associate to each imported record
    #[arg(long)]
    extra_categories: Option<String>,

    /// Comma-separated tag slugs to associate to each imported record
    #[arg(long)]
    extra_tags: Option<String>,

    /// Taxonomy of --extra-custom-terms; without it those terms are ignored
    #[arg(long)]
    extra_custom_terms_taxonomy: Option<String>,

    /// Comma-separated terms: IDs for hierarchical taxonomies, names otherwise
    #[arg(long)]
    extra_custom_terms: Option<String>,

    /// Comma-separated metadata keys to associate to each imported record
    #[arg(long)]
    extra_post_meta_keys: Option<String>,

    /// Comma-separated metadata values, paired in order with --extra-post-meta-keys
    #[arg(long)]
    extra_post_meta_values: Option<String>,

    /// Do not import categories, except those set with --extra-categories
    #[arg(long)]
    skip_categories: bool,

    /// Do not import tags, except those set with --extra-tags
    #[arg(long)]
    skip_tags: bool,

    /// Print a table of the queries made for each record
    #[arg(long)]
    profile: bool,

    /// Log per-record progress
    #[arg(long, short)]
    verbose: bool,

    /// Path to the SQLite content store
    #[arg(long)]
    db: Option<PathBuf>,
}

impl Cli {
    /// Flatten the parsed arguments into the option mapping the resolver reads.
    fn options(&self) -> ImportOptions {
        let mut options = ImportOptions::new();
        let values = [
            (option::AUTHORS, &self.authors),
            (option::SKIP, &self.skip),
            (option::URL, &self.url),
            (option::EXTRA_CATEGORIES, &self.extra_categories),
            (option::EXTRA_TAGS, &self.extra_tags),
            (option::EXTRA_CUSTOM_TERMS_TAXONOMY, &self.extra_custom_terms_taxonomy),
            (option::EXTRA_CUSTOM_TERMS, &self.extra_custom_terms),
            (option::EXTRA_POST_META_KEYS, &self.extra_post_meta_keys),
            (option::EXTRA_POST_META_VALUES, &self.extra_post_meta_values),
        ];
        for (key, value) in values {
            if let Some(value) = value {
                options.insert(key, value.as_str());
            }
        }

        let flags = [
            (option::SKIP_CATEGORIES, self.skip_categories),
            (option::SKIP_TAGS, self.skip_tags),
            (option::PROFILE, self.profile),
        ];
        for (key, set) in flags {
            if set {
                options.insert(key, "");
            }
        }
        options
    }
}

/// Get the default database path (~/.local/share/import-plus/content.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("import-plus").join("content.db")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "import_plus=info" } else { "import_plus=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Print the success marker. With `--profile`, stdout carries only the
/// YAML report stream, so the marker goes to stderr instead.
fn write_success<'a>(
    profile: bool,
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
) -> std::io::Result<()> {
    let out = if profile { stderr } else { stdout };
    writeln!(out, "Success: ok")
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose || cli.profile);

    let db_path = cli.db.clone().unwrap_or_else(default_db_path);
    let store = match SqliteStore::open(&db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error: failed to open database at {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
    };

    let plus = ImportPlus::new(ExportImporter::new(store));
    match plus.run(&cli.file, &cli.options()) {
        Ok(summary) => {
            tracing::info!(
                files = summary.files,
                imported = summary.imported,
                failed = summary.failed,
                "done"
            );
            let _ = write_success(cli.profile, &mut std::io::stdout(), &mut std::io::stderr());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flattens_into_options() {
        let cli = Cli::parse_from([
            "import-plus",
            "export.json",
            "--extra-tags=imported",
            "--extra-post-meta-keys=source",
            "--extra-post-meta-values=legacy-cms",
            "--skip-categories",
            "--authors=skip",
        ]);
        let options = cli.options();
        assert_eq!(options.value(option::EXTRA_TAGS), Some("imported"));
        assert_eq!(options.value(option::EXTRA_POST_META_VALUES), Some("legacy-cms"));
        assert!(options.flag(option::SKIP_CATEGORIES));
        assert!(!options.flag(option::SKIP_TAGS));
        assert!(!options.flag(option::PROFILE));
        assert_eq!(options.host_subset().value(option::AUTHORS), Some("skip"));
    }

    #[test]
    fn success_marker_stays_out_of_profile_stream() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        write_success(true, &mut out, &mut err).unwrap();
        assert!(out.is_empty());
        assert_eq!(err, b"Success: ok\n");

        let (mut out, mut err) = (Vec::new(), Vec::new());
        write_success(false, &mut out, &mut err).unwrap();
        assert_eq!(out, b"Success: ok\n");
        assert!(err.is_empty());
    }

    #[test]
    fn file_argument_is_required() {
        assert!(Cli::try_parse_from(["import-plus"]).is_err());
    }
}
