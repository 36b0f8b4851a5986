/// Configuration for the translation pipeline
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::prompt::{build_system_prompt, PromptProfile, DEFAULT_LANGUAGE_NAMES};

pub const CONFIG_FILE_NAME: &str = "i18n-translate.config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api key and endpoint id must be configured")]
    MissingCredentials,

    #[error("no target languages configured")]
    NoTargetLanguages,

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("configuration could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub endpoint_id: String,

    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Languages to translate into. Listing the source language is allowed;
    /// it is skipped at run time.
    #[serde(default)]
    pub target_languages: Vec<String>,

    /// Locale root relative to the project, for workflows anchored somewhere
    /// other than the file being translated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_dir: Option<String>,

    /// Full replacement for the generated system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_description: Option<String>,
}

fn default_source_lang() -> String {
    "en".to_string()
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint_id: String::new(),
            source_lang: default_source_lang(),
            target_languages: Vec::new(),
            translate_dir: None,
            system_prompt: None,
            project_name: None,
            project_description: None,
        }
    }
}

impl TranslatorConfig {
    /// Starter configuration with every known language enabled.
    pub fn template() -> Self {
        Self {
            target_languages: DEFAULT_LANGUAGE_NAMES
                .iter()
                .map(|(code, _)| code.to_string())
                .collect(),
            translate_dir: Some("./src/locales".to_string()),
            ..Self::default()
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    /// A file that exists and fails to parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = self.to_json()?;
        content.push('\n');
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Run preconditions shared by every entry point.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() || self.endpoint_id.trim().is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        let has_target = self
            .target_languages
            .iter()
            .any(|language| language != &self.source_lang);
        if !has_target {
            return Err(ConfigError::NoTargetLanguages);
        }
        Ok(())
    }

    /// The prompt actually sent: the configured override when present,
    /// otherwise one built from the profile.
    pub fn resolve_system_prompt(&self) -> String {
        match &self.system_prompt {
            Some(prompt) if !prompt.trim().is_empty() => prompt.clone(),
            _ => build_system_prompt(&self.prompt_profile()),
        }
    }

    pub fn prompt_profile(&self) -> PromptProfile {
        let mut profile = PromptProfile::default();
        if let Some(name) = &self.project_name {
            profile.project_name = name.clone();
        }
        if let Some(description) = &self.project_description {
            profile.project_description = description.clone();
        }
        profile
    }

    /// Directory the locale scanner starts from: the configured translate
    /// dir resolved against `base`, otherwise `base` itself.
    pub fn scan_root(&self, base: &Path) -> PathBuf {
        match self.translate_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => {
                let dir = Path::new(dir);
                base.join(dir.strip_prefix(".").unwrap_or(dir))
            }
            _ => base.to_path_buf(),
        }
    }
}

/// Workspace-local configuration file, committed alongside the project.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Per-user fallback under the platform configuration directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("i18n-translator").join("config.json"))
}

/// First existing configuration file: workspace first, then the user file.
pub fn locate_config(root: &Path) -> Option<PathBuf> {
    let workspace = default_config_path(root);
    if workspace.exists() {
        return Some(workspace);
    }
    user_config_path().filter(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn configured() -> TranslatorConfig {
        TranslatorConfig {
            api_key: "key".to_string(),
            endpoint_id: "ep-123".to_string(),
            target_languages: vec!["fr".to_string(), "ja-JP".to_string()],
            ..TranslatorConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = TranslatorConfig::default();
        assert_eq!(config.source_lang, "en");
        assert!(config.api_key.is_empty());
        assert!(config.target_languages.is_empty());
    }

    #[test]
    fn test_json_round_trip_uses_camel_case() {
        let json = configured().to_json().unwrap();
        assert!(json.contains("\"apiKey\""));
        assert!(json.contains("\"endpointId\""));
        assert!(json.contains("\"targetLanguages\""));
        assert!(!json.contains("\"systemPrompt\""));

        let config = TranslatorConfig::from_json(&json).unwrap();
        assert_eq!(config.endpoint_id, "ep-123");
        assert_eq!(config.target_languages, vec!["fr", "ja-JP"]);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config = TranslatorConfig::from_json(r#"{"apiKey": "key"}"#).unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.source_lang, "en");
        assert!(config.target_languages.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            TranslatorConfig::default().validate(),
            Err(ConfigError::MissingCredentials)
        ));

        let mut config = configured();
        config.target_languages.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoTargetLanguages)
        ));

        config.target_languages = vec!["en".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoTargetLanguages)
        ));

        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_template_enables_known_languages() {
        let template = TranslatorConfig::template();
        assert_eq!(template.target_languages.len(), 13);
        assert!(template.target_languages.contains(&"zh-CN".to_string()));
        assert_eq!(template.translate_dir.as_deref(), Some("./src/locales"));
    }

    #[test]
    fn test_system_prompt_override_wins() {
        let mut config = configured();
        assert!(config.resolve_system_prompt().contains("Language codes:"));

        config.system_prompt = Some("Translate tersely.".to_string());
        assert_eq!(config.resolve_system_prompt(), "Translate tersely.");

        config.system_prompt = Some("   ".to_string());
        assert!(config.resolve_system_prompt().contains("Language codes:"));
    }

    #[test]
    fn test_save_load_and_locate() {
        let dir = tempdir().unwrap();
        let path = default_config_path(dir.path());

        configured().save(&path).unwrap();
        assert_eq!(locate_config(dir.path()), Some(path.clone()));

        let loaded = TranslatorConfig::load(&path).unwrap();
        assert_eq!(loaded.api_key, "key");
        assert_eq!(loaded.target_languages, vec!["fr", "ja-JP"]);
    }

    #[test]
    fn test_load_or_default_keeps_parse_errors() {
        let dir = tempdir().unwrap();
        let path = default_config_path(dir.path());

        let fresh = TranslatorConfig::load_or_default(&path).unwrap();
        assert!(fresh.api_key.is_empty());

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            TranslatorConfig::load_or_default(&path),
            Err(ConfigError::Parse(_))
        ));

        configured().save(&path).unwrap();
        let loaded = TranslatorConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.endpoint_id, "ep-123");
    }

    #[test]
    fn test_scan_root_resolves_translate_dir() {
        let base = Path::new("/proj");
        let mut config = configured();
        assert_eq!(config.scan_root(base), PathBuf::from("/proj"));

        config.translate_dir = Some("./src/locales".to_string());
        assert_eq!(config.scan_root(base), PathBuf::from("/proj/src/locales"));

        config.translate_dir = Some("   ".to_string());
        assert_eq!(config.scan_root(base), PathBuf::from("/proj"));

        config.translate_dir = Some("/srv/shared/locales".to_string());
        assert_eq!(config.scan_root(base), PathBuf::from("/srv/shared/locales"));
    }
}
