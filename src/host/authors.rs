//! Author mapping for imported records

use super::traits::{AuthorMode, HostError};
use super::types::ExportRecord;
use crate::storage::ContentStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// One row of an author mapping CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MappingRow {
    old_user_login: String,
    new_user_login: String,
}

/// Resolves export author logins to store author ids.
#[derive(Debug)]
pub enum AuthorMap {
    Create,
    Mapped(HashMap<String, String>),
    Skip,
}

impl AuthorMap {
    /// Prepare the mapping for a run.
    ///
    /// A mapping file that doesn't exist yet is written as a template
    /// (every export author mapped to itself) and the run stops so the
    /// user can edit it.
    pub fn prepare(mode: &AuthorMode, records: &[ExportRecord]) -> Result<Self, HostError> {
        match mode {
            AuthorMode::Create => Ok(Self::Create),
            AuthorMode::Skip => Ok(Self::Skip),
            AuthorMode::Mapping(path) if path.exists() => Ok(Self::Mapped(read_mapping(path)?)),
            AuthorMode::Mapping(path) => {
                write_template(path, records)?;
                Err(HostError::AuthorMappingCreated(path.clone()))
            }
        }
    }

    /// Store author id for an export login. Unmapped logins import without an author.
    pub fn resolve(
        &self,
        login: Option<&str>,
        store: &dyn ContentStore,
    ) -> Result<Option<i64>, HostError> {
        let Some(login) = login.filter(|l| !l.is_empty()) else {
            return Ok(None);
        };
        let target = match self {
            Self::Skip => return Ok(None),
            Self::Create => login,
            Self::Mapped(map) => match map.get(login) {
                Some(target) => target.as_str(),
                None => {
                    tracing::warn!(login, "author not in mapping file, importing without author");
                    return Ok(None);
                }
            },
        };
        Ok(Some(store.ensure_author(target)?))
    }
}

fn read_mapping(path: &Path) -> Result<HashMap<String, String>, HostError> {
    let mapping_error = |source: csv::Error| HostError::AuthorMapping {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(mapping_error)?;
    let mut map = HashMap::new();
    for row in reader.deserialize::<MappingRow>() {
        let row = row.map_err(mapping_error)?;
        map.insert(row.old_user_login, row.new_user_login);
    }
    Ok(map)
}

fn write_template(path: &Path, records: &[ExportRecord]) -> Result<(), HostError> {
    let logins: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.author.as_deref())
        .filter(|l| !l.is_empty())
        .collect();

    let mapping_error = |source: csv::Error| HostError::AuthorMapping {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(mapping_error)?;
    // Header row is written even when the export has no authors
    writer
        .write_record(["old_user_login", "new_user_login"])
        .map_err(mapping_error)?;
    for login in logins {
        writer.write_record([login, login]).map_err(mapping_error)?;
    }
    writer.flush()?;
    Ok(())
}
