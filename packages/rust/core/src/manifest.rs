//! Cognitive models manifest reader.
//!
//! Reads `cognitivemodels.json` and exposes the entry for a locale. The
//! manifest is never written here.

use std::path::Path;

use tracing::{debug, instrument};

use botskills_shared::{BotSkillsError, CognitiveModelSet, LocaleModels, Result};

/// Top-level key wrapping the per-locale map in assistant manifests.
const COGNITIVE_MODELS_KEY: &str = "cognitiveModels";

/// Read and parse the manifest at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn read_cognitive_models(path: &Path) -> Result<CognitiveModelSet> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BotSkillsError::io(path, e))?;

    let models = parse_cognitive_models(&content, path)?;
    debug!(locales = models.locales.len(), "cognitive models loaded");
    Ok(models)
}

/// Parse manifest content. `source` only labels errors.
///
/// Accepts both `{ "cognitiveModels": { "<code>": ... } }` and a bare
/// `{ "<code>": ... }` map.
pub fn parse_cognitive_models(content: &str, source: &Path) -> Result<CognitiveModelSet> {
    let document: serde_json::Value =
        serde_json::from_str(content).map_err(|e| BotSkillsError::parse(source, e.to_string()))?;

    let locales = match document {
        serde_json::Value::Object(mut map) => match map.remove(COGNITIVE_MODELS_KEY) {
            Some(inner) => inner,
            None => serde_json::Value::Object(map),
        },
        other => other,
    };

    serde_json::from_value(locales).map_err(|e| BotSkillsError::parse(source, e.to_string()))
}

/// Entry for `language_code`, falling back to the full `language` tag.
pub fn locale_entry<'a>(
    models: &'a CognitiveModelSet,
    language_code: &str,
    language: &str,
    source: &Path,
) -> Result<&'a LocaleModels> {
    models
        .locale(language_code)
        .or_else(|| models.locale(language))
        .ok_or_else(|| {
            let available: Vec<&str> = models.locales.keys().map(String::as_str).collect();
            BotSkillsError::lookup(format!(
                "no entry for locale '{language_code}' in {} (available: {})",
                source.display(),
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            ))
        })
}
