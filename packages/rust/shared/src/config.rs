//! Configuration for botskills.
//!
//! Two layers live here:
//! - the per-invocation path/locale resolver, which turns CLI overrides plus
//!   project-structure conventions into concrete absolute paths;
//! - the optional user tool config at `~/.botskills/botskills.toml`, naming
//!   the external generators to invoke.

use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BotSkillsError, Result};
use crate::types::LgLanguage;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "botskills.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".botskills";

/// Locale used when `--language` is omitted.
pub const DEFAULT_LANGUAGE: &str = "en-us";

/// Manifest file name inside the assistant project.
pub const COGNITIVE_MODELS_FILE_NAME: &str = "cognitivemodels.json";

static LOCALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2,3}(-[a-z0-9]+)*$").expect("locale regex is valid")
});

// ---------------------------------------------------------------------------
// Path/locale resolution (per invocation)
// ---------------------------------------------------------------------------

/// Raw user-supplied overrides, exactly as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RefreshOverrides {
    pub cs: bool,
    pub ts: bool,
    pub dispatch_name: Option<String>,
    pub language: Option<String>,
    pub dispatch_folder: Option<String>,
    pub out_folder: Option<String>,
    pub lg_out_folder: Option<String>,
    pub cognitive_models_file: Option<String>,
}

/// Concrete paths and locale derived from overrides plus conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    /// Explicit `--dispatchName`, trimmed; the manifest supplies it otherwise.
    pub dispatch_name: Option<String>,
    pub lg_language: LgLanguage,
    pub language: String,
    pub language_code: String,
    pub out_folder: PathBuf,
    pub dispatch_folder: PathBuf,
    pub lg_out_folder: PathBuf,
    pub cognitive_models_file: PathBuf,
}

/// Resolve every path and locale the refresh needs.
///
/// Pure: no file I/O. Relative overrides are anchored at `cwd`, which is also
/// the default `outFolder`.
pub fn resolve(overrides: &RefreshOverrides, cwd: &Path) -> Result<ResolvedPaths> {
    let lg_language = validate_pair_of_args(overrides.cs, overrides.ts)?;
    let (language, language_code) = normalize_language(overrides.language.as_deref())?;

    let out_folder = match non_blank(&overrides.out_folder) {
        Some(raw) => sanitize_path(raw, cwd),
        None => normalize(cwd),
    };

    let cognitive_models_file = match non_blank(&overrides.cognitive_models_file) {
        Some(raw) => sanitize_path(raw, cwd),
        None => match lg_language {
            LgLanguage::Cs => out_folder.join(COGNITIVE_MODELS_FILE_NAME),
            LgLanguage::Ts => out_folder.join("src").join(COGNITIVE_MODELS_FILE_NAME),
        },
    };

    let dispatch_folder = match non_blank(&overrides.dispatch_folder) {
        Some(raw) => sanitize_path(raw, cwd),
        None => out_folder
            .join("Deployment")
            .join("Resources")
            .join("Dispatch")
            .join(&language_code),
    };

    let lg_out_folder = match non_blank(&overrides.lg_out_folder) {
        Some(raw) => sanitize_path(raw, cwd),
        None => match lg_language {
            LgLanguage::Cs => out_folder.join("Services"),
            LgLanguage::Ts => out_folder.join("src").join("Services"),
        },
    };

    tracing::debug!(
        %lg_language,
        %language,
        out_folder = %out_folder.display(),
        dispatch_folder = %dispatch_folder.display(),
        lg_out_folder = %lg_out_folder.display(),
        cognitive_models_file = %cognitive_models_file.display(),
        "resolved refresh paths"
    );

    Ok(ResolvedPaths {
        dispatch_name: non_blank(&overrides.dispatch_name).map(|s| s.trim().to_string()),
        lg_language,
        language,
        language_code,
        out_folder,
        dispatch_folder,
        lg_out_folder,
        cognitive_models_file,
    })
}

/// Exactly one of `--cs`/`--ts` must be set.
pub fn validate_pair_of_args(cs: bool, ts: bool) -> Result<LgLanguage> {
    match (cs, ts) {
        (true, false) => Ok(LgLanguage::Cs),
        (false, true) => Ok(LgLanguage::Ts),
        (true, true) => Err(BotSkillsError::config(
            "Only one of the arguments '--cs', '--ts' should be provided.",
        )),
        (false, false) => Err(BotSkillsError::config(
            "One of the arguments '--cs', '--ts' must be provided.",
        )),
    }
}

/// Normalize a locale tag, returning `(language, language_code)`.
pub fn normalize_language(raw: Option<&str>) -> Result<(String, String)> {
    let language = raw
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    if !LOCALE_RE.is_match(&language) {
        return Err(BotSkillsError::config(format!(
            "invalid language '{language}': expected a locale tag such as '{DEFAULT_LANGUAGE}'"
        )));
    }

    let language_code = language
        .split('-')
        .next()
        .unwrap_or(&language)
        .to_string();

    Ok((language, language_code))
}

/// Sanitize a user path: unify separators, drop trailing separators,
/// resolve `.`/`..` lexically and anchor relative paths at `base`.
pub fn sanitize_path(raw: &str, base: &Path) -> PathBuf {
    let unified: String = raw
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect();

    let path = Path::new(&unified);
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tool config (botskills.toml)
// ---------------------------------------------------------------------------

/// Top-level user config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// External generator settings.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// `[tools]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Dispatcher model builder executable.
    #[serde(default = "default_dispatch_cmd")]
    pub dispatch_cmd: String,

    /// Binding class generator executable.
    #[serde(default = "default_luisgen_cmd")]
    pub luisgen_cmd: String,

    /// Name of the generated dispatcher binding class.
    #[serde(default = "default_binding_class")]
    pub binding_class: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            dispatch_cmd: default_dispatch_cmd(),
            luisgen_cmd: default_luisgen_cmd(),
            binding_class: default_binding_class(),
        }
    }
}

fn default_dispatch_cmd() -> String {
    "dispatch".into()
}
fn default_luisgen_cmd() -> String {
    "luisgen".into()
}
fn default_binding_class() -> String {
    "DispatchLuis".into()
}

/// Get the path to the config directory (`~/.botskills/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BotSkillsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.botskills/botskills.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the user config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the user config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BotSkillsError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BotSkillsError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BotSkillsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| BotSkillsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BotSkillsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proj() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(r"C:\proj")
        } else {
            PathBuf::from("/proj")
        }
    }

    fn overrides(cs: bool, ts: bool) -> RefreshOverrides {
        RefreshOverrides {
            cs,
            ts,
            ..Default::default()
        }
    }

    #[test]
    fn ts_defaults() {
        let resolved = resolve(&overrides(false, true), &proj()).expect("resolve");
        assert_eq!(resolved.lg_language, LgLanguage::Ts);
        assert_eq!(
            resolved.cognitive_models_file,
            proj().join("src").join("cognitivemodels.json")
        );
        assert_eq!(resolved.lg_out_folder, proj().join("src").join("Services"));
        assert_eq!(resolved.out_folder, proj());
    }

    #[test]
    fn cs_defaults() {
        let resolved = resolve(&overrides(true, false), &proj()).expect("resolve");
        assert_eq!(resolved.lg_language, LgLanguage::Cs);
        assert_eq!(resolved.cognitive_models_file, proj().join("cognitivemodels.json"));
        assert_eq!(resolved.lg_out_folder, proj().join("Services"));
        assert_eq!(
            resolved.dispatch_folder,
            proj()
                .join("Deployment")
                .join("Resources")
                .join("Dispatch")
                .join("en")
        );
    }

    #[test]
    fn language_defaults_to_en_us() {
        let resolved = resolve(&overrides(true, false), &proj()).expect("resolve");
        assert_eq!(resolved.language, "en-us");
        assert_eq!(resolved.language_code, "en");
    }

    #[test]
    fn language_override_drives_dispatch_folder() {
        let mut o = overrides(false, true);
        o.language = Some(" DE-de ".into());
        let resolved = resolve(&o, &proj()).expect("resolve");
        assert_eq!(resolved.language, "de-de");
        assert_eq!(resolved.language_code, "de");
        assert!(resolved.dispatch_folder.ends_with("Dispatch/de"));
    }

    #[test]
    fn invalid_language_rejected() {
        let mut o = overrides(true, false);
        o.language = Some("en_us".into());
        let err = resolve(&o, &proj()).unwrap_err();
        assert!(matches!(err, BotSkillsError::Config { .. }));
    }

    #[test]
    fn both_or_neither_flags_rejected() {
        let err = resolve(&overrides(true, true), &proj()).unwrap_err();
        assert!(err.to_string().contains("Only one of the arguments"));

        let err = resolve(&overrides(false, false), &proj()).unwrap_err();
        assert!(err.to_string().contains("must be provided"));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut o = overrides(true, false);
        o.out_folder = Some("assistant/".into());
        o.dispatch_folder = Some("/data/dispatch/".into());
        o.lg_out_folder = Some("./gen\\".into());
        o.cognitive_models_file = Some("../models/cm.json".into());

        let cwd = proj().join("work");
        let resolved = resolve(&o, &cwd).expect("resolve");
        assert_eq!(resolved.out_folder, cwd.join("assistant"));
        assert_eq!(resolved.lg_out_folder, cwd.join("gen"));
        assert_eq!(
            resolved.cognitive_models_file,
            proj().join("models").join("cm.json")
        );
        assert!(resolved.dispatch_folder.is_absolute());
        assert!(resolved.dispatch_folder.ends_with("data/dispatch"));
        // defaults derive from the overridden outFolder
        let mut o = overrides(false, true);
        o.out_folder = Some("assistant".into());
        let resolved = resolve(&o, &cwd).expect("resolve");
        assert_eq!(
            resolved.cognitive_models_file,
            cwd.join("assistant").join("src").join("cognitivemodels.json")
        );
    }

    #[test]
    fn dispatch_name_override_carried_through() {
        let mut o = overrides(true, false);
        assert_eq!(resolve(&o, &proj()).expect("resolve").dispatch_name, None);

        o.dispatch_name = Some("  acme  ".into());
        let resolved = resolve(&o, &proj()).expect("resolve");
        assert_eq!(resolved.dispatch_name.as_deref(), Some("acme"));

        o.dispatch_name = Some("   ".into());
        assert_eq!(resolve(&o, &proj()).expect("resolve").dispatch_name, None);
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        let mut o = overrides(true, false);
        o.lg_out_folder = Some("   ".into());
        let resolved = resolve(&o, &proj()).expect("resolve");
        assert_eq!(resolved.lg_out_folder, proj().join("Services"));
    }

    #[test]
    fn sanitize_strips_trailing_separator() {
        let base = proj();
        assert_eq!(sanitize_path("Services/", &base), base.join("Services"));
        assert_eq!(sanitize_path("a/./b/../c", &base), base.join("a").join("c"));
    }

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("dispatch_cmd"));
        assert!(toml_str.contains("DispatchLuis"));
    }

    #[test]
    fn partial_tools_section_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[tools]
luisgen_cmd = "/opt/tools/luisgen"
"#,
        )
        .expect("parse");
        assert_eq!(config.tools.luisgen_cmd, "/opt/tools/luisgen");
        assert_eq!(config.tools.dispatch_cmd, "dispatch");
    }

    #[test]
    fn malformed_config_file_is_config_error() {
        let path = std::env::temp_dir().join(format!(
            "botskills-config-test-{}.toml",
            uuid::Uuid::now_v7()
        ));
        std::fs::write(&path, "[tools\nbroken").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, BotSkillsError::Config { .. }));
        let _ = std::fs::remove_file(&path);
    }
}
