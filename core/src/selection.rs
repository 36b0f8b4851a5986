/// Selection text interpretation
///
/// Selections arrive as whatever the user happened to highlight: a complete
/// JSON object, a headless `"key": "value"` list, a fragment with a single
/// root key, or a slice of a module object literal. The extractor tries
/// structured parses first and only falls back to lossy pair scanning, which
/// supports flat string values only.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::FileKind;

static MODULE_PAIR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"['"]([^'"]+)['"]\s*:\s*['"]([^'"]+)['"]"#).expect("valid module pair regex")
});

static ROOT_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)^"([^"]+)"\s*:\s*(\{.*\})$"#).expect("valid root key regex")
});

static SCAN_PAIR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)":\s*"([^"]+)""#).expect("valid pair scan regex"));

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("selection is not an exported object literal")]
    MissingModuleLiteral,

    #[error("no quoted key/value pairs found in selection")]
    NoPairs,

    #[error("selection is not a JSON object or key/value list")]
    NotKeyValue,

    #[error("root-keyed object value is not valid JSON: {0}")]
    InvalidNestedValue(#[source] serde_json::Error),
}

/// A selection interpreted exactly once per invocation.
///
/// The JSON payload sent to the translation service is serialized here so
/// the key set is bit-identical for every target language.
#[derive(Debug, Clone)]
pub struct SelectionContent {
    raw: String,
    mapping: Map<String, Value>,
    payload: String,
}

impl SelectionContent {
    pub fn from_text(raw: &str, kind: FileKind) -> Result<Self, SelectionError> {
        let mapping = extract_selection(raw, kind)?;
        let payload = Value::Object(mapping.clone()).to_string();
        Ok(Self {
            raw: raw.to_string(),
            mapping,
            payload,
        })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    pub fn mapping(&self) -> &Map<String, Value> {
        &self.mapping
    }

    /// Compact JSON form of the mapping, identical across all languages.
    pub fn payload_json(&self) -> &str {
        &self.payload
    }

    pub fn key_count(&self) -> usize {
        self.mapping.len()
    }
}

/// Turns a raw selection into a key/value mapping.
///
/// Ordered fallback chain, first success wins:
/// 1. module files: scan quoted pairs out of the literal body
/// 2. parse the whole text as a JSON object (only path with nesting)
/// 3. `"rootKey": { ... }` form, nesting the parsed tail under the key
/// 4. bare pair list, wrapped in braces and parsed
/// 5. lossy `"key": "value"` scan over the raw text
pub fn extract_selection(raw: &str, kind: FileKind) -> Result<Map<String, Value>, SelectionError> {
    match kind {
        FileKind::Module => extract_module_pairs(raw),
        FileKind::Data => extract_data_mapping(raw),
    }
}

fn extract_module_pairs(raw: &str) -> Result<Map<String, Value>, SelectionError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("export default") && !trimmed.contains('=') {
        return Err(SelectionError::MissingModuleLiteral);
    }

    let mut mapping = Map::new();
    for captures in MODULE_PAIR_REGEX.captures_iter(trimmed) {
        mapping.insert(
            captures[1].to_string(),
            Value::String(captures[2].to_string()),
        );
    }

    if mapping.is_empty() {
        return Err(SelectionError::NoPairs);
    }
    Ok(mapping)
}

fn extract_data_mapping(raw: &str) -> Result<Map<String, Value>, SelectionError> {
    if let Ok(Value::Object(mapping)) = serde_json::from_str::<Value>(raw) {
        return Ok(mapping);
    }

    let trimmed = raw.trim();
    if let Some(captures) = ROOT_KEY_REGEX.captures(trimmed) {
        let nested: Value = serde_json::from_str(&captures[2])
            .map_err(SelectionError::InvalidNestedValue)?;
        let mut mapping = Map::new();
        mapping.insert(captures[1].to_string(), nested);
        return Ok(mapping);
    }

    let looks_like_pair_list = (trimmed.starts_with('"') || trimmed.contains("\":"))
        && !trimmed.starts_with('{')
        && !trimmed.ends_with('}');
    if !looks_like_pair_list {
        return Err(SelectionError::NotKeyValue);
    }

    let wrapped = format!("{{{trimmed}}}");
    if let Ok(Value::Object(mapping)) = serde_json::from_str::<Value>(&wrapped) {
        return Ok(mapping);
    }

    scan_flat_pairs(raw)
}

/// Last resort: harvest every `"key": "value"` pair and ignore the noise
/// around them.
fn scan_flat_pairs(raw: &str) -> Result<Map<String, Value>, SelectionError> {
    let mut mapping = Map::new();
    for captures in SCAN_PAIR_REGEX.captures_iter(raw) {
        mapping.insert(
            captures[1].to_string(),
            Value::String(captures[2].to_string()),
        );
    }

    if mapping.is_empty() {
        return Err(SelectionError::NoPairs);
    }
    Ok(mapping)
}
