/// Translation run orchestration
///
/// A run walks the configured target languages in order and pushes one
/// selection through resolve, read, translate, merge, and write for each.
/// Failures are isolated per language; cancellation is cooperative and only
/// observed between stages, so a file that is being written always lands
/// complete.
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::ai::Translator;
use crate::config::{ConfigError, TranslatorConfig};
use crate::context::SourceFileContext;
use crate::paths::resolve_target_path;
use crate::selection::SelectionContent;
use crate::store;

/// Shared cancellation flag checked between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub run_id: String,
    pub status: JobStatus,
    pub language: String,
    pub completed: u32,
    pub total: u32,
    pub progress_pct: f32,
}

/// Receives one event per finished language.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum LanguageOutcome {
    Written { path: PathBuf, keys_merged: usize },
    Failed { message: String },
}

impl LanguageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LanguageOutcome::Written { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageReport {
    pub language: String,
    #[serde(flatten)]
    pub outcome: LanguageOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub status: JobStatus,
    pub reports: Vec<LanguageReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }
}

/// Runs the full pipeline for every configured target language.
///
/// The configuration is validated before anything else happens, so a broken
/// setup never produces a partial run. The source language is skipped when it
/// appears among the targets.
pub async fn run_translation(
    selection: &SelectionContent,
    ctx: &SourceFileContext,
    config: &TranslatorConfig,
    translator: &dyn Translator,
    sink: &dyn ProgressSink,
    cancel: &CancelFlag,
) -> Result<RunSummary, ConfigError> {
    config.validate()?;

    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let system_prompt = config.resolve_system_prompt();
    let languages: Vec<&str> = config
        .target_languages
        .iter()
        .map(String::as_str)
        .filter(|language| *language != ctx.source_language)
        .collect();
    let total = languages.len() as u32;

    let mut reports: Vec<LanguageReport> = Vec::new();
    let mut status = JobStatus::Completed;

    for language in languages {
        if cancel.is_cancelled() {
            status = JobStatus::Cancelled;
            break;
        }

        let Some(outcome) =
            process_language(selection, ctx, &system_prompt, translator, cancel, language).await
        else {
            status = JobStatus::Cancelled;
            break;
        };

        if let LanguageOutcome::Failed { message } = &outcome {
            warn!("translation into {language} failed: {message}");
        }
        reports.push(LanguageReport {
            language: language.to_string(),
            outcome,
        });

        sink.emit(ProgressEvent {
            run_id: run_id.clone(),
            status: JobStatus::Running,
            language: language.to_string(),
            completed: reports.len() as u32,
            total,
            progress_pct: percentage(reports.len() as u32, total),
        });
    }

    Ok(RunSummary {
        run_id,
        status,
        reports,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Translates one language end to end. `None` means cancellation was
/// observed between stages, before anything was written for this language.
async fn process_language(
    selection: &SelectionContent,
    ctx: &SourceFileContext,
    system_prompt: &str,
    translator: &dyn Translator,
    cancel: &CancelFlag,
    language: &str,
) -> Option<LanguageOutcome> {
    let target_path = resolve_target_path(ctx, language);

    if cancel.is_cancelled() {
        return None;
    }

    let mut existing = match store::read_mapping(&target_path, ctx.kind) {
        Ok(existing) => existing,
        Err(err) => {
            return Some(LanguageOutcome::Failed {
                message: err.to_string(),
            })
        }
    };

    let translated = match translator
        .translate(system_prompt, selection.payload_json(), language)
        .await
    {
        Ok(translated) => translated,
        Err(err) => {
            return Some(LanguageOutcome::Failed {
                message: err.to_string(),
            })
        }
    };

    if cancel.is_cancelled() {
        return None;
    }

    let keys_merged = translated.len();
    store::merge_mapping(&mut existing, translated);
    match store::write_mapping(&target_path, &existing, ctx.kind) {
        Ok(()) => Some(LanguageOutcome::Written {
            path: target_path,
            keys_merged,
        }),
        Err(err) => Some(LanguageOutcome::Failed {
            message: err.to_string(),
        }),
    }
}

fn percentage(processed: u32, total: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((processed as f32) / (total as f32) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FileKind;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::path::Path;
    use std::sync::atomic::AtomicU32;

    struct CountingTranslator {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        async fn translate(
            &self,
            _system_prompt: &str,
            _content: &str,
            _language: &str,
        ) -> Result<Map<String, Value>, crate::ai::TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Map::new())
        }
    }

    struct NullSink;

    impl ProgressSink for NullSink {
        fn emit(&self, _event: ProgressEvent) {}
    }

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(9, 4), 100.0);
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let shared = flag.clone();
        shared.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn unconfigured_run_fails_before_any_request() {
        let selection = SelectionContent::from_text(r#"{"a":"b"}"#, FileKind::Data).unwrap();
        let ctx =
            SourceFileContext::new(Path::new("/proj/locales/en/common.json"), "en").unwrap();
        let translator = CountingTranslator {
            calls: AtomicU32::new(0),
        };

        let result = tokio_test::block_on(run_translation(
            &selection,
            &ctx,
            &TranslatorConfig::default(),
            &translator,
            &NullSink,
            &CancelFlag::new(),
        ));

        assert!(matches!(result, Err(ConfigError::MissingCredentials)));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }
}
