//! Error types for botskills.
//!
//! Library crates use [`BotSkillsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::RefreshStage;

/// Top-level error type for all botskills operations.
#[derive(Debug, thiserror::Error)]
pub enum BotSkillsError {
    /// Invalid or conflicting flags, missing dispatch name, bad tool config.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed JSON in the manifest or a dispatcher file.
    #[error("parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The manifest has no entry for the requested locale.
    #[error("lookup error: {message}")]
    Lookup { message: String },

    /// An external generation step failed.
    #[error("{stage} failed: {message}")]
    Orchestration {
        stage: RefreshStage,
        message: String,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BotSkillsError>;

impl BotSkillsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error naming the offending file.
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a lookup error from any displayable message.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup {
            message: msg.into(),
        }
    }

    /// Create an orchestration error for the given stage.
    pub fn orchestration(stage: RefreshStage, msg: impl Into<String>) -> Self {
        Self::Orchestration {
            stage,
            message: msg.into(),
        }
    }

    /// The refresh stage that failed, if this is an orchestration error.
    pub fn stage(&self) -> Option<RefreshStage> {
        match self {
            Self::Orchestration { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BotSkillsError::config("missing dispatch name");
        assert_eq!(err.to_string(), "config error: missing dispatch name");

        let err = BotSkillsError::orchestration(RefreshStage::RegenerateBindings, "exit code 2");
        assert!(err.to_string().starts_with("binding regeneration failed"));
        assert_eq!(err.stage(), Some(RefreshStage::RegenerateBindings));
    }

    #[test]
    fn parse_error_names_file() {
        let err = BotSkillsError::parse("/proj/cognitivemodels.json", "expected value");
        assert!(err.to_string().contains("cognitivemodels.json"));
        assert_eq!(err.stage(), None);
    }
}
