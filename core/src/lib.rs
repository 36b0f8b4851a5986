pub mod ai;
pub mod config;
pub mod context;
pub mod jobs;
pub mod paths;
pub mod prompt;
pub mod response;
pub mod scanner;
pub mod selection;
pub mod store;

pub use ai::{ArkClient, TranslationError, Translator, ARK_BASE_URL};
pub use config::{
    default_config_path, locate_config, user_config_path, ConfigError, TranslatorConfig,
    CONFIG_FILE_NAME,
};
pub use context::{ContextError, FileKind, SourceFileContext};
pub use jobs::{
    run_translation, CancelFlag, JobStatus, LanguageOutcome, LanguageReport, ProgressEvent,
    ProgressSink, RunSummary,
};
pub use paths::resolve_target_path;
pub use prompt::{build_system_prompt, build_user_content, PromptProfile};
pub use response::{recover_object, ResponseFormatError};
pub use scanner::{LocaleDirectory, LocaleFile, LocaleScanner, ScanOptions};
pub use selection::{extract_selection, SelectionContent, SelectionError};
pub use store::{merge_mapping, read_mapping, write_mapping, StoreError};
