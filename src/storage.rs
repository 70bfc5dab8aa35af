// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for exported documents

use crate::constants::naming;
use crate::errors::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default directory for exported documents (`~/Documents/Scans`)
pub fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(naming::DEFAULT_SAVE_FOLDER)
}

/// Make a user-typed name safe to use as a single file name component
///
/// Path separators and control characters become `_`; a name that is only dots
/// would resolve to a directory and is replaced by `fallback`.
pub fn sanitize_file_stem(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.trim_matches('.').trim().is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// `<dir>/<name>.pdf`
pub fn document_path(dir: &Path, name: &str, fallback: &str) -> PathBuf {
    let stem = sanitize_file_stem(name, fallback);
    dir.join(format!("{}.{}", stem, naming::DOCUMENT_EXTENSION))
}

/// Write a finished document, creating the parent directory if needed
pub fn write_document(path: &Path, bytes: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Storage(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    std::fs::write(path, bytes)
        .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), size = bytes.len(), "Document written");
    Ok(())
}
