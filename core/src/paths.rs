/// Target path resolution across directory naming conventions
use std::path::{Component, Path, PathBuf};

use crate::context::{FileKind, SourceFileContext};

/// Base language code without a region suffix (`en-US` -> `en`).
pub(crate) fn language_base(language: &str) -> &str {
    language.split('-').next().unwrap_or(language)
}

/// Whether `segment` is a region-qualified directory name for `language`,
/// e.g. `en-US` or `en-GB` for `en` (or for `en-US` itself).
pub(crate) fn is_region_variant(segment: &str, language: &str) -> bool {
    let base = language_base(language);
    segment
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|region| region.len() == 2 && region.chars().all(|c| c.is_ascii_uppercase()))
}

/// Computes the on-disk location of a target language's translation file.
///
/// Pure function of the source context and the target code; never touches
/// the file system. Conventions are tried in priority order and the first
/// match wins, they are never combined:
///
/// 1. a region-qualified directory component (`locales/en-US/` -> `locales/fr/`)
/// 2. a bare source-language directory component (`locales/en/` -> `locales/fr/`)
/// 3. the language code inside the file name (`en.json` -> `fr.json`)
/// 4. module files only: a language-suffixed sibling (`common.ts` -> `common.fr.ts`)
pub fn resolve_target_path(ctx: &SourceFileContext, target_language: &str) -> PathBuf {
    if let Some(dir) = substitute_language_component(ctx, target_language) {
        return dir.join(&ctx.file_name);
    }

    let language_file = format!("{}.{}", ctx.source_language, ctx.extension);
    if ctx.file_name.contains(&language_file) {
        let target_file = format!("{}.{}", target_language, ctx.extension);
        return ctx
            .directory
            .join(ctx.file_name.replacen(&language_file, &target_file, 1));
    }

    match ctx.kind {
        // No recognizable convention: mirror the source name in place.
        FileKind::Data => ctx.directory.join(&ctx.file_name),
        FileKind::Module => ctx.directory.join(format!(
            "{}.{}.{}",
            ctx.file_stem(),
            target_language,
            ctx.extension
        )),
    }
}

/// Rewrites the directory when some component names the source language,
/// either region-qualified (priority) or bare.
fn substitute_language_component(
    ctx: &SourceFileContext,
    target_language: &str,
) -> Option<PathBuf> {
    let region_match = |segment: &str| {
        (segment == ctx.source_language && segment.contains('-'))
            || is_region_variant(segment, &ctx.source_language)
    };
    let bare_match = |segment: &str| segment == ctx.source_language;

    rewrite_component(&ctx.directory, target_language, region_match)
        .or_else(|| rewrite_component(&ctx.directory, target_language, bare_match))
}

fn rewrite_component(
    directory: &Path,
    target_language: &str,
    matches: impl Fn(&str) -> bool,
) -> Option<PathBuf> {
    let mut rewritten = PathBuf::new();
    let mut replaced = false;

    for component in directory.components() {
        match component {
            Component::Normal(segment) if !replaced => {
                match segment.to_str() {
                    Some(name) if matches(name) => {
                        rewritten.push(target_language);
                        replaced = true;
                    }
                    _ => rewritten.push(segment),
                }
            }
            other => rewritten.push(other.as_os_str()),
        }
    }

    replaced.then_some(rewritten)
}
