//! Refresh configuration assembler.
//!
//! Combines resolved paths with the manifest entry for the resolved locale.
//! No file I/O happens here.

use tracing::debug;

use botskills_shared::{
    BotSkillsError, CognitiveModelSet, RefreshConfiguration, ResolvedPaths, Result,
};

use crate::manifest::locale_entry;

/// Build the immutable [`RefreshConfiguration`].
///
/// `dispatchName` precedence: explicit override carried in `paths`, then the
/// locale entry's `dispatchModel.name`. A missing locale entry is a lookup error.
pub fn assemble(paths: ResolvedPaths, models: &CognitiveModelSet) -> Result<RefreshConfiguration> {
    let entry = locale_entry(
        models,
        &paths.language_code,
        &paths.language,
        &paths.cognitive_models_file,
    )?;

    let dispatch_name = match paths.dispatch_name {
        Some(name) => name,
        None => entry
            .dispatch_name()
            .map(String::from)
            .ok_or_else(|| {
                BotSkillsError::config(format!(
                    "dispatchModel.name is missing for locale '{}' in {}; pass --dispatchName",
                    paths.language_code,
                    paths.cognitive_models_file.display()
                ))
            })?,
    };

    if dispatch_name.contains(['/', '\\']) {
        return Err(BotSkillsError::config(format!(
            "dispatch name '{dispatch_name}' must be a file stem, not a path"
        )));
    }

    debug!(
        %dispatch_name,
        language_models = entry.language_models.len(),
        "assembled refresh configuration"
    );

    Ok(RefreshConfiguration {
        dispatch_name,
        dispatch_folder: paths.dispatch_folder,
        language: paths.language,
        language_code: paths.language_code,
        lg_language: paths.lg_language,
        out_folder: paths.out_folder,
        lg_out_folder: paths.lg_out_folder,
        cognitive_models_file: paths.cognitive_models_file,
        language_models: entry.language_models.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use botskills_shared::{LgLanguage, RefreshOverrides, resolve};

    use super::*;
    use crate::manifest::parse_cognitive_models;

    fn resolved(cs: bool, ts: bool) -> ResolvedPaths {
        resolved_with_name(cs, ts, None)
    }

    fn resolved_with_name(cs: bool, ts: bool, dispatch_name: Option<&str>) -> ResolvedPaths {
        let overrides = RefreshOverrides {
            cs,
            ts,
            dispatch_name: dispatch_name.map(String::from),
            ..Default::default()
        };
        resolve(&overrides, Path::new("/proj")).expect("resolve")
    }

    fn models(content: &str) -> CognitiveModelSet {
        parse_cognitive_models(content, &PathBuf::from("cognitivemodels.json")).expect("parse")
    }

    const ACME: &str = r#"{ "cognitiveModels": { "en": {
        "dispatchModel": { "name": "acme-dispatch" },
        "languageModels": [ { "id": "General" } ]
    } } }"#;

    #[test]
    fn name_comes_from_manifest() {
        let config = assemble(resolved(true, false), &models(ACME)).expect("assemble");
        assert_eq!(config.dispatch_name, "acme-dispatch");
        assert_eq!(config.language, "en-us");
        assert_eq!(config.language_code, "en");
        assert_eq!(config.language_models.len(), 1);
    }

    #[test]
    fn lg_language_matches_flag() {
        let config = assemble(resolved(true, false), &models(ACME)).expect("assemble");
        assert_eq!(config.lg_language, LgLanguage::Cs);

        let config = assemble(resolved(false, true), &models(ACME)).expect("assemble");
        assert_eq!(config.lg_language, LgLanguage::Ts);
        assert!(config.lg_out_folder.ends_with("src/Services"));
    }

    #[test]
    fn override_wins() {
        let config =
            assemble(resolved_with_name(true, false, Some("custom")), &models(ACME)).expect("assemble");
        assert_eq!(config.dispatch_name, "custom");
    }

    #[test]
    fn missing_locale_is_lookup_error() {
        let other = r#"{ "cognitiveModels": { "de": { "dispatchModel": { "name": "x" } } } }"#;
        let err = assemble(resolved(true, false), &models(other)).unwrap_err();
        assert!(matches!(err, BotSkillsError::Lookup { .. }));
    }

    #[test]
    fn missing_name_is_config_error() {
        let nameless = r#"{ "cognitiveModels": { "en": { "languageModels": [] } } }"#;
        let err = assemble(resolved(true, false), &models(nameless)).unwrap_err();
        assert!(matches!(err, BotSkillsError::Config { .. }));
        assert!(err.to_string().contains("dispatchModel.name"));

        // a blank override does not count as supplied
        let err = assemble(resolved_with_name(true, false, Some(" ")), &models(nameless)).unwrap_err();
        assert!(matches!(err, BotSkillsError::Config { .. }));
    }

    #[test]
    fn path_like_name_rejected() {
        let err =
            assemble(resolved_with_name(true, false, Some("../evil")), &models(ACME)).unwrap_err();
        assert!(matches!(err, BotSkillsError::Config { .. }));
    }
}
