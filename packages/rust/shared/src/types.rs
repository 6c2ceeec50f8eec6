//! Core domain types for the botskills refresh pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cognitive models manifest
// ---------------------------------------------------------------------------

/// The contents of `cognitivemodels.json`: one entry per locale code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CognitiveModelSet {
    pub locales: BTreeMap<String, LocaleModels>,
}

impl CognitiveModelSet {
    /// Entry for a locale key, if present.
    pub fn locale(&self, key: &str) -> Option<&LocaleModels> {
        self.locales.get(key)
    }
}

/// Models connected to the assistant for a single locale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleModels {
    /// Top-level dispatcher recognizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_model: Option<DispatchModel>,
    /// Connected skill recognizers, in manifest order.
    #[serde(default)]
    pub language_models: Vec<LanguageModel>,
    /// QnA knowledge bases; carried through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledgebases: Vec<serde_json::Value>,
}

impl LocaleModels {
    /// The dispatcher name, if the entry carries a non-empty one.
    pub fn dispatch_name(&self) -> Option<&str> {
        self.dispatch_model
            .as_ref()
            .map(|d| d.name.trim())
            .filter(|name| !name.is_empty())
    }
}

/// Identity of the dispatcher recognizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchModel {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "appid", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, alias = "authoringkey", skip_serializing_if = "Option::is_none")]
    pub authoring_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoring_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, alias = "subscriptionkey", skip_serializing_if = "Option::is_none")]
    pub subscription_key: Option<String>,
}

/// Identity of a connected skill recognizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "appid", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, alias = "authoringkey", skip_serializing_if = "Option::is_none")]
    pub authoring_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoring_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, alias = "subscriptionkey", skip_serializing_if = "Option::is_none")]
    pub subscription_key: Option<String>,
}

impl LanguageModel {
    /// Identifier used when matching against dispatcher services: `id`, else `name`.
    pub fn key(&self) -> &str {
        if self.id.is_empty() { &self.name } else { &self.id }
    }
}

// ---------------------------------------------------------------------------
// Project convention and stages
// ---------------------------------------------------------------------------

/// Assistant project-structure convention, also the binding generation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LgLanguage {
    /// C#-style layout: manifest and `Services/` at the project root.
    Cs,
    /// TypeScript-style layout: everything under `src/`.
    Ts,
}

impl LgLanguage {
    /// Short name as used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cs => "cs",
            Self::Ts => "ts",
        }
    }

    /// Generator flag selecting the target language.
    pub fn generator_flag(&self) -> &'static str {
        match self {
            Self::Cs => "-cs",
            Self::Ts => "-ts",
        }
    }
}

impl std::fmt::Display for LgLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named stage of the refresh sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshStage {
    RebuildDispatchModel,
    RegenerateBindings,
}

impl std::fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RebuildDispatchModel => f.write_str("dispatch model rebuild"),
            Self::RegenerateBindings => f.write_str("binding regeneration"),
        }
    }
}

// ---------------------------------------------------------------------------
// RefreshConfiguration
// ---------------------------------------------------------------------------

/// Fully resolved input for one refresh run. Built once, then only borrowed.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshConfiguration {
    /// Dispatcher name; `<dispatch_folder>/<dispatch_name>.dispatch` is its source.
    pub dispatch_name: String,
    /// Folder holding the dispatcher source and model artifact.
    pub dispatch_folder: PathBuf,
    /// Full locale tag, e.g. `en-us`.
    pub language: String,
    /// Primary subtag of `language`, e.g. `en`.
    pub language_code: String,
    /// Project convention and binding target.
    pub lg_language: LgLanguage,
    /// Assistant project root.
    pub out_folder: PathBuf,
    /// Destination for generated binding classes.
    pub lg_out_folder: PathBuf,
    /// Manifest that was read.
    pub cognitive_models_file: PathBuf,
    /// Skill recognizers connected for this locale.
    pub language_models: Vec<LanguageModel>,
}

impl RefreshConfiguration {
    /// Dispatcher source file (`<name>.dispatch`).
    pub fn dispatch_file(&self) -> PathBuf {
        self.dispatch_folder
            .join(format!("{}.dispatch", self.dispatch_name))
    }

    /// Dispatcher model artifact (`<name>.json`) rewritten by the rebuild.
    pub fn model_artifact(&self) -> PathBuf {
        self.dispatch_folder.join(format!("{}.json", self.dispatch_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_models_accept_original_spellings() {
        let json = r#"{
            "dispatchModel": {
                "type": "dispatch",
                "name": "acme-dispatch",
                "appid": "a1",
                "authoringkey": "k1",
                "authoringRegion": "westus",
                "region": "westus",
                "subscriptionkey": "s1"
            },
            "languageModels": [
                { "id": "General", "name": "acme-general", "appid": "g1", "version": "0.1", "subscriptionkey": "s2" }
            ]
        }"#;
        let models: LocaleModels = serde_json::from_str(json).expect("deserialize");
        assert_eq!(models.dispatch_name(), Some("acme-dispatch"));
        let dispatch = models.dispatch_model.as_ref().expect("dispatch model");
        assert_eq!(dispatch.app_id.as_deref(), Some("a1"));
        assert_eq!(dispatch.authoring_key.as_deref(), Some("k1"));
        assert_eq!(dispatch.subscription_key.as_deref(), Some("s1"));
        assert_eq!(models.language_models.len(), 1);
        assert_eq!(models.language_models[0].key(), "General");
        assert_eq!(models.language_models[0].subscription_key.as_deref(), Some("s2"));
    }

    #[test]
    fn blank_dispatch_name_is_absent() {
        let models = LocaleModels {
            dispatch_model: Some(DispatchModel {
                name: "  ".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(models.dispatch_name(), None);
        assert_eq!(LocaleModels::default().dispatch_name(), None);
    }

    #[test]
    fn language_model_key_falls_back_to_name() {
        let model = LanguageModel {
            name: "calendarskill".into(),
            ..Default::default()
        };
        assert_eq!(model.key(), "calendarskill");
    }

    #[test]
    fn dispatcher_file_names() {
        let config = RefreshConfiguration {
            dispatch_name: "acme".into(),
            dispatch_folder: PathBuf::from("/proj/Deployment/Resources/Dispatch/en"),
            language: "en-us".into(),
            language_code: "en".into(),
            lg_language: LgLanguage::Cs,
            out_folder: PathBuf::from("/proj"),
            lg_out_folder: PathBuf::from("/proj/Services"),
            cognitive_models_file: PathBuf::from("/proj/cognitivemodels.json"),
            language_models: vec![],
        };
        assert!(config.dispatch_file().ends_with("Dispatch/en/acme.dispatch"));
        assert!(config.model_artifact().ends_with("Dispatch/en/acme.json"));
        assert_eq!(config.lg_language.generator_flag(), "-cs");
    }
}
