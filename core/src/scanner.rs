/// Locale discovery across a project tree
///
/// Finds the directories a project keeps translations in. Two layouts are
/// recognized: language-named files (`locales/en.json`) and per-language
/// directories (`locales/en/common.json`). Results group by the locale root
/// so callers see one entry per translation set.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::context::FileKind;

static LOCALE_FILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]{2}(-[A-Z]{2})?)\.(json|ts|js|mjs|cjs)$").expect("valid locale file regex")
});

static LANGUAGE_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").expect("valid language code regex"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Directory names never descended into.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Recursion limit below the scan root.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_skip_dirs() -> Vec<String> {
    ["node_modules", ".git", "target", "dist", "build"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn default_max_depth() -> usize {
    16
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            skip_dirs: default_skip_dirs(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleFile {
    pub path: PathBuf,
    pub language: String,
    pub kind: FileKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleDirectory {
    pub path: PathBuf,
    pub files: Vec<LocaleFile>,
}

#[derive(Debug, Default)]
pub struct LocaleScanner {
    options: ScanOptions,
}

impl LocaleScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn scan(&self, root: &Path) -> io::Result<Vec<LocaleDirectory>> {
        let mut grouped: BTreeMap<PathBuf, Vec<LocaleFile>> = BTreeMap::new();
        self.scan_recursive(root, 0, &mut grouped)?;

        Ok(grouped
            .into_iter()
            .map(|(path, mut files)| {
                files.sort_by(|a, b| {
                    (&a.language, &a.path).cmp(&(&b.language, &b.path))
                });
                LocaleDirectory { path, files }
            })
            .collect())
    }

    fn scan_recursive(
        &self,
        current: &Path,
        depth: usize,
        grouped: &mut BTreeMap<PathBuf, Vec<LocaleFile>>,
    ) -> io::Result<()> {
        for entry in fs::read_dir(current)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                let skipped = path
                    .file_name()
                    .and_then(OsStr::to_str)
                    .is_some_and(|name| self.options.skip_dirs.iter().any(|dir| dir == name));
                if !skipped && depth < self.options.max_depth {
                    self.scan_recursive(&path, depth + 1, grouped)?;
                }
            } else if path.is_file() {
                if let Some((root, file)) = classify(&path) {
                    grouped.entry(root).or_default().push(file);
                }
            }
        }
        Ok(())
    }
}

/// Decides whether `path` belongs to a translation set and which locale root
/// it groups under.
fn classify(path: &Path) -> Option<(PathBuf, LocaleFile)> {
    let file_name = path.file_name().and_then(OsStr::to_str)?;
    let parent = path.parent()?;

    if let Some(captures) = LOCALE_FILE_REGEX.captures(file_name) {
        let kind = FileKind::from_path(path)?;
        return Some((
            parent.to_path_buf(),
            LocaleFile {
                path: path.to_path_buf(),
                language: captures[1].to_string(),
                kind,
            },
        ));
    }

    let kind = FileKind::from_path(path)?;
    let dir_name = parent.file_name().and_then(OsStr::to_str)?;
    if LANGUAGE_CODE_REGEX.is_match(dir_name) {
        return Some((
            parent.parent()?.to_path_buf(),
            LocaleFile {
                path: path.to_path_buf(),
                language: dir_name.to_string(),
                kind,
            },
        ));
    }

    None
}
