/// Locale file persistence
///
/// Reads, merges, and rewrites the per-language locale files. Data files are
/// plain JSON and parse strictly; module files carry an `export default`
/// object literal and degrade to an empty mapping when the literal cannot be
/// recovered, so a damaged file never blocks a translation run. All writes
/// land through a temp-file swap so a crash mid-write cannot truncate the
/// target.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::context::FileKind;

static MODULE_EXPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)export\s+default\s+(\{.*\})").expect("valid module export regex")
});

static BARE_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+):").expect("valid bare key regex"));

static TRAILING_COMMA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma regex"));

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("locale file is not valid: {0}")]
    Parse(String),

    #[error("locale file could not be serialized: {0}")]
    Serialization(String),

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Loads the mapping stored at `path`.
///
/// A missing file reads as an empty mapping so first-time targets merge
/// cleanly. An unreadable module literal also reads as empty; data files
/// that exist but fail to parse are an error instead, because overwriting
/// a hand-edited JSON file would lose its contents.
pub fn read_mapping(path: &Path, kind: FileKind) -> Result<Map<String, Value>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(err) => return Err(StoreError::Io(err)),
    };

    match kind {
        FileKind::Data => parse_data_document(&raw, path),
        FileKind::Module => Ok(parse_module_document(&raw, path)),
    }
}

/// Shallow merge: every translated key replaces its counterpart, keys absent
/// from the translation are left untouched.
pub fn merge_mapping(existing: &mut Map<String, Value>, translated: Map<String, Value>) {
    for (key, value) in translated {
        existing.insert(key, value);
    }
}

pub fn write_mapping(
    path: &Path,
    mapping: &Map<String, Value>,
    kind: FileKind,
) -> Result<(), StoreError> {
    let contents = match kind {
        FileKind::Data => render_data_document(mapping)?,
        FileKind::Module => render_module_document(mapping),
    };
    write_atomic(path, contents.as_bytes())
}

fn parse_data_document(raw: &str, path: &Path) -> Result<Map<String, Value>, StoreError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(mapping)) => Ok(mapping),
        Ok(_) => Err(StoreError::Parse(format!(
            "{} does not contain a top-level JSON object",
            path.display()
        ))),
        Err(err) => Err(StoreError::Parse(format!("{}: {err}", path.display()))),
    }
}

fn parse_module_document(raw: &str, path: &Path) -> Map<String, Value> {
    let Some(captures) = MODULE_EXPORT_REGEX.captures(raw) else {
        log::warn!(
            "{} has no default-exported object literal, starting from an empty mapping",
            path.display()
        );
        return Map::new();
    };

    let normalized = normalize_module_literal(&captures[1]);
    match serde_json::from_str::<Value>(&normalized) {
        Ok(Value::Object(mapping)) => mapping,
        _ => {
            log::warn!(
                "object literal in {} could not be parsed, starting from an empty mapping",
                path.display()
            );
            Map::new()
        }
    }
}

/// Rewrites a JS/TS object literal into parseable JSON: double quotes,
/// quoted keys, no trailing commas.
fn normalize_module_literal(literal: &str) -> String {
    let double_quoted = literal.replace('\'', "\"");
    let keyed = BARE_KEY_REGEX.replace_all(&double_quoted, "\"$1\":");
    TRAILING_COMMA_REGEX.replace_all(&keyed, "$1").into_owned()
}

fn render_data_document(mapping: &Map<String, Value>) -> Result<String, StoreError> {
    let mut rendered = serde_json::to_string_pretty(mapping)
        .map_err(|err| StoreError::Serialization(err.to_string()))?;
    rendered.push('\n');
    Ok(rendered)
}

/// Values containing single quotes are written as-is and will not survive a
/// re-read.
fn render_module_document(mapping: &Map<String, Value>) -> String {
    let mut rendered = String::from("export default {\n");
    for (key, value) in mapping {
        let text = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        rendered.push_str(&format!("  '{key}': '{text}',\n"));
    }
    rendered.push_str("};\n");
    rendered
}

fn write_atomic(target: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let parent = target.parent().ok_or_else(|| {
        io::Error::new(ErrorKind::InvalidInput, "target path has no parent directory")
    })?;
    fs::create_dir_all(parent)?;

    let temp_path = build_temp_path(target);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    #[cfg(target_os = "windows")]
    {
        if let Err(err) = fs::rename(&temp_path, target) {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(target)?;
                fs::rename(&temp_path, target)?;
            } else {
                return Err(StoreError::Io(err));
            }
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        fs::rename(&temp_path, target)?;
    }

    Ok(())
}

fn build_temp_path(target: &Path) -> PathBuf {
    let mut temp = target.to_path_buf();
    let pid = std::process::id();
    let suffix = format!("__tmp__pid_{pid}");
    match temp.file_name() {
        Some(name) => {
            let mut os_string = name.to_os_string();
            os_string.push(suffix);
            temp.set_file_name(os_string);
        }
        None => {
            temp.push(format!("temp_{pid}"));
        }
    }
    temp
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn mapping(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), json!(value)))
            .collect()
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let mapping = read_mapping(&dir.path().join("fr.json"), FileKind::Data).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn data_round_trip_preserves_entries_and_order() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("locales").join("fr.json");
        let entries = mapping(&[("zeta", "Z"), ("alpha", "A")]);

        write_mapping(&target, &entries, FileKind::Data).unwrap();
        let raw = fs::read_to_string(&target).unwrap();
        assert!(raw.starts_with("{\n  \"zeta\": \"Z\""));
        assert!(raw.ends_with("}\n"));

        let reread = read_mapping(&target, FileKind::Data).unwrap();
        assert_eq!(reread, entries);
    }

    #[test]
    fn invalid_data_file_is_an_error() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("fr.json");
        fs::write(&target, "not json at all").unwrap();
        assert!(matches!(
            read_mapping(&target, FileKind::Data),
            Err(StoreError::Parse(_))
        ));

        fs::write(&target, "[1, 2]").unwrap();
        assert!(matches!(
            read_mapping(&target, FileKind::Data),
            Err(StoreError::Parse(_))
        ));
    }

    #[test]
    fn module_read_handles_quotes_bare_keys_and_trailing_commas() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("messages.fr.ts");
        fs::write(
            &target,
            "export default {\n  'login': 'Connexion',\n  logout: 'Sortie',\n};\n",
        )
        .unwrap();

        let entries = read_mapping(&target, FileKind::Module).unwrap();
        assert_eq!(entries.get("login"), Some(&json!("Connexion")));
        assert_eq!(entries.get("logout"), Some(&json!("Sortie")));
    }

    #[test]
    fn unreadable_module_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("messages.fr.ts");

        fs::write(&target, "const nothing = 1;\n").unwrap();
        assert!(read_mapping(&target, FileKind::Module).unwrap().is_empty());

        fs::write(&target, "export default { 'broken: }\n").unwrap();
        assert!(read_mapping(&target, FileKind::Module).unwrap().is_empty());
    }

    #[test]
    fn module_write_emits_default_export_literal() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("messages.fr.ts");
        write_mapping(&target, &mapping(&[("login", "Connexion")]), FileKind::Module).unwrap();

        let raw = fs::read_to_string(&target).unwrap();
        assert_eq!(raw, "export default {\n  'login': 'Connexion',\n};\n");
    }

    #[test]
    fn module_round_trip_accumulates_across_runs() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("messages.fr.ts");

        write_mapping(&target, &mapping(&[("login", "Connexion")]), FileKind::Module).unwrap();
        let mut existing = read_mapping(&target, FileKind::Module).unwrap();
        merge_mapping(&mut existing, mapping(&[("logout", "Sortie")]));
        write_mapping(&target, &existing, FileKind::Module).unwrap();

        let reread = read_mapping(&target, FileKind::Module).unwrap();
        assert_eq!(reread.len(), 2);
        assert_eq!(reread.get("login"), Some(&json!("Connexion")));
        assert_eq!(reread.get("logout"), Some(&json!("Sortie")));
    }

    #[test]
    fn merge_overwrites_and_keeps_stale_keys() {
        let mut existing = mapping(&[("login", "Old"), ("stale", "Kept")]);
        merge_mapping(&mut existing, mapping(&[("login", "New"), ("extra", "Added")]));

        assert_eq!(existing.get("login"), Some(&json!("New")));
        assert_eq!(existing.get("stale"), Some(&json!("Kept")));
        assert_eq!(existing.get("extra"), Some(&json!("Added")));
    }

    #[test]
    fn merge_is_idempotent() {
        let translated = mapping(&[("a", "1"), ("b", "2")]);
        let mut once = mapping(&[("a", "0")]);
        merge_mapping(&mut once, translated.clone());
        let mut twice = once.clone();
        merge_mapping(&mut twice, translated);
        assert_eq!(once, twice);
    }

    #[test]
    fn swap_write_replaces_contents_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("fr.json");
        write_mapping(&target, &mapping(&[("a", "1")]), FileKind::Data).unwrap();
        write_mapping(&target, &mapping(&[("a", "2")]), FileKind::Data).unwrap();

        let reread = read_mapping(&target, FileKind::Data).unwrap();
        assert_eq!(reread.get("a"), Some(&json!("2")));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("fr.json")]);
    }
}
