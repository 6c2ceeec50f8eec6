//! Shared types, error model, and configuration for botskills.
//!
//! This crate is the foundation depended on by the other botskills crates.
//! It provides:
//! - [`BotSkillsError`], the unified error type
//! - Domain types ([`CognitiveModelSet`], [`RefreshConfiguration`], [`LgLanguage`])
//! - Path/locale resolution ([`resolve`]) and the user tool config ([`AppConfig`])

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, COGNITIVE_MODELS_FILE_NAME, DEFAULT_LANGUAGE, RefreshOverrides, ResolvedPaths,
    ToolsConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    normalize_language, resolve, sanitize_path, validate_pair_of_args,
};
pub use error::{BotSkillsError, Result};
pub use types::{
    CognitiveModelSet, DispatchModel, LanguageModel, LgLanguage, LocaleModels,
    RefreshConfiguration, RefreshStage,
};
