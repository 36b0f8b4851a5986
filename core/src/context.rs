/// Source file description and on-disk format detection
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::paths::is_region_variant;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
}

/// On-disk representation of a translation file.
///
/// `Data` files hold plain JSON. `Module` files hold a source-code object
/// literal (`export default { ... }`) and only support flat string entries
/// on write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Data,
    Module,
}

impl FileKind {
    /// Detect the kind from a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Data),
            "ts" | "js" | "mjs" | "cjs" => Some(Self::Module),
            _ => None,
        }
    }

    /// Detect the kind from a path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(OsStr::to_str)
            .and_then(Self::from_extension)
    }
}

/// Immutable description of the file a selection was taken from.
///
/// Format detection happens exactly once, here. Everything downstream
/// matches on [`FileKind`] instead of re-inspecting the extension.
#[derive(Debug, Clone)]
pub struct SourceFileContext {
    pub path: PathBuf,
    pub file_name: String,
    pub directory: PathBuf,
    /// Lowercased extension without the leading dot.
    pub extension: String,
    pub source_language: String,
    pub kind: FileKind,
}

impl SourceFileContext {
    pub fn new(path: &Path, source_language: &str) -> Result<Self, ContextError> {
        let unsupported = || ContextError::UnsupportedFileType(path.display().to_string());

        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .ok_or_else(unsupported)?;
        let kind = FileKind::from_extension(&extension).ok_or_else(unsupported)?;
        let file_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(unsupported)?
            .to_string();
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            directory,
            extension,
            source_language: source_language.to_string(),
            kind,
        })
    }

    /// File name without the extension.
    pub fn file_stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or(&self.file_name)
    }

    /// Whether this file plausibly holds source-language content: the file
    /// name carries the language code, or some directory component is the
    /// language code or a region-qualified variant of it.
    pub fn is_source_language_file(&self) -> bool {
        if self.file_name.contains(&self.source_language) {
            return true;
        }

        self.directory.components().any(|component| match component {
            Component::Normal(segment) => segment.to_str().is_some_and(|name| {
                name == self.source_language || is_region_variant(name, &self.source_language)
            }),
            _ => false,
        })
    }
}
