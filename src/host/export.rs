//! Export file discovery and decoding

use super::traits::HostError;
use super::types::ExportDocument;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXPORT_EXTENSION: &str = "json";

/// The export files to import for a path: the file itself, or every
/// `*.json` file under a directory in sorted path order.
pub fn export_files(path: &Path) -> Result<Vec<PathBuf>, HostError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(HostError::ExportNotFound(path.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            HostError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        let is_export = entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(EXPORT_EXTENSION);
        if is_export {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(HostError::EmptyExportDirectory(path.to_path_buf()));
    }
    Ok(files)
}

/// Read and decode one export document.
pub fn read_export(path: &Path) -> Result<ExportDocument, HostError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| HostError::InvalidExport {
        path: path.to_path_buf(),
        source,
    })
}
