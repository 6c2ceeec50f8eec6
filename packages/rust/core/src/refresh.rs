//! Dispatcher refresh orchestrator.
//!
//! Runs two named stages in order, stopping at the first failure:
//! 1. rebuild the dispatcher model artifact from its `.dispatch` source
//! 2. regenerate the binding classes from the rebuilt artifact
//!
//! Writes are not transactional. A failure in stage 2 leaves the artifact
//! from stage 1 in place.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use botskills_shared::{
    BotSkillsError, LanguageModel, LgLanguage, RefreshConfiguration, RefreshStage, Result,
    ToolsConfig,
};

// ---------------------------------------------------------------------------
// External tool seam
// ---------------------------------------------------------------------------

/// A single external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external generators. `Err` means the process could not be run at all.
pub trait ToolRunner: Send + Sync {
    fn run(
        &self,
        invocation: &ToolInvocation,
    ) -> impl Future<Output = std::io::Result<ToolOutput>> + Send;
}

/// [`ToolRunner`] backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: PathBuf,
}

impl ProcessRunner {
    /// Run tools from `working_dir` (the assistant project root).
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> std::io::Result<ToolOutput> {
        // npm-installed generators are `.cmd` shims on Windows
        let mut command = if cfg!(windows) {
            let mut c = tokio::process::Command::new("cmd");
            c.arg("/C").arg(&invocation.program);
            c
        } else {
            tokio::process::Command::new(&invocation.program)
        };

        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if self.working_dir.is_dir() {
            command.current_dir(&self.working_dir);
        }

        let output = command.output().await?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Progress + report
// ---------------------------------------------------------------------------

/// Result of a successful refresh.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub dispatch_name: String,
    pub language: String,
    pub lg_language: LgLanguage,
    /// Rebuilt dispatcher model artifact.
    pub model_artifact: PathBuf,
    /// SHA-256 of the artifact after the rebuild.
    pub model_digest: String,
    /// Whether the artifact differs from what was on disk before.
    pub model_changed: bool,
    /// Folder that received the binding classes.
    pub lg_out_folder: PathBuf,
    /// Connected models not registered as dispatcher services.
    pub unregistered_models: Vec<String>,
    pub elapsed: Duration,
}

/// Progress callback for reporting refresh status.
pub trait RefreshProgress: Send + Sync {
    /// Called when a stage starts.
    fn stage(&self, stage: RefreshStage);
    /// Called when a stage fails; no further stages run.
    fn failed(&self, stage: RefreshStage);
    /// Called when the refresh completes.
    fn done(&self, report: &RefreshReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl RefreshProgress for SilentProgress {
    fn stage(&self, _stage: RefreshStage) {}
    fn failed(&self, _stage: RefreshStage) {}
    fn done(&self, _report: &RefreshReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Outcome of the model rebuild stage.
#[derive(Debug, Clone)]
pub struct RebuiltModel {
    pub artifact: PathBuf,
    pub digest: String,
    pub changed: bool,
    pub unregistered_models: Vec<String>,
}

/// Run the full refresh: rebuild, then regenerate bindings, then report.
#[instrument(skip_all, fields(dispatch = %config.dispatch_name, language = %config.language))]
pub async fn refresh<R: ToolRunner>(
    config: &RefreshConfiguration,
    tools: &ToolsConfig,
    runner: &R,
    progress: &dyn RefreshProgress,
) -> Result<RefreshReport> {
    let start = Instant::now();
    info!(
        lg_language = %config.lg_language,
        dispatch_folder = %config.dispatch_folder.display(),
        "starting refresh"
    );

    progress.stage(RefreshStage::RebuildDispatchModel);
    let rebuilt = match rebuild_dispatch_model(config, tools, runner).await {
        Ok(rebuilt) => rebuilt,
        Err(e) => {
            progress.failed(RefreshStage::RebuildDispatchModel);
            return Err(e);
        }
    };

    progress.stage(RefreshStage::RegenerateBindings);
    let bindings = regenerate_bindings(config, tools, runner, &rebuilt.artifact).await;
    let lg_out_folder = match bindings {
        Ok(folder) => folder,
        Err(e) => {
            if rebuilt.changed {
                warn!(
                    artifact = %rebuilt.artifact.display(),
                    "dispatch model was already rewritten; generated bindings are now stale"
                );
            }
            progress.failed(RefreshStage::RegenerateBindings);
            return Err(e);
        }
    };

    let report = RefreshReport {
        dispatch_name: config.dispatch_name.clone(),
        language: config.language.clone(),
        lg_language: config.lg_language,
        model_artifact: rebuilt.artifact,
        model_digest: rebuilt.digest,
        model_changed: rebuilt.changed,
        lg_out_folder,
        unregistered_models: rebuilt.unregistered_models,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        model_changed = report.model_changed,
        elapsed_ms = report.elapsed.as_millis(),
        "refresh complete"
    );

    Ok(report)
}

/// Stage 1: re-run the dispatcher build over `<name>.dispatch`, overwriting
/// `<name>.json` in the dispatch folder.
#[instrument(skip_all)]
pub async fn rebuild_dispatch_model<R: ToolRunner>(
    config: &RefreshConfiguration,
    tools: &ToolsConfig,
    runner: &R,
) -> Result<RebuiltModel> {
    let stage = RefreshStage::RebuildDispatchModel;
    let dispatch_file = config.dispatch_file();
    let artifact = config.model_artifact();

    let source = tokio::fs::read_to_string(&dispatch_file)
        .await
        .map_err(|e| {
            BotSkillsError::io(
                &dispatch_file,
                std::io::Error::new(
                    e.kind(),
                    format!("{e}; check --dispatchFolder and --dispatchName"),
                ),
            )
        })?;

    let services = dispatch_services(&source, &dispatch_file)?;
    let unregistered = unregistered_models(&config.language_models, &services);
    for model in &unregistered {
        warn!(
            model = %model,
            dispatch_file = %dispatch_file.display(),
            "connected language model is not a service of the dispatch file"
        );
    }

    let previous = previous_digest(&artifact).await;

    let invocation = ToolInvocation::new(
        &tools.dispatch_cmd,
        [
            "refresh".to_string(),
            "--bot".to_string(),
            dispatch_file.to_string_lossy().into_owned(),
            "--dataFolder".to_string(),
            config.dispatch_folder.to_string_lossy().into_owned(),
        ],
    );
    run_tool(runner, stage, &invocation).await?;

    let bytes = tokio::fs::read(&artifact).await.map_err(|e| {
        BotSkillsError::orchestration(
            stage,
            format!("expected model artifact {} was not produced: {e}", artifact.display()),
        )
    })?;
    serde_json::from_slice::<serde_json::Value>(&bytes).map_err(|e| {
        BotSkillsError::orchestration(
            stage,
            format!("model artifact {} is malformed: {e}", artifact.display()),
        )
    })?;

    let digest = sha256_hex(&bytes);
    let changed = previous.as_deref() != Some(digest.as_str());
    info!(artifact = %artifact.display(), changed, "dispatch model rebuilt");

    Ok(RebuiltModel {
        artifact,
        digest,
        changed,
        unregistered_models: unregistered,
    })
}

/// Stage 2: generate binding classes for `artifact` into `lgOutFolder`.
#[instrument(skip_all)]
pub async fn regenerate_bindings<R: ToolRunner>(
    config: &RefreshConfiguration,
    tools: &ToolsConfig,
    runner: &R,
    artifact: &Path,
) -> Result<PathBuf> {
    let stage = RefreshStage::RegenerateBindings;

    tokio::fs::create_dir_all(&config.lg_out_folder)
        .await
        .map_err(|e| BotSkillsError::io(&config.lg_out_folder, e))?;

    let invocation = ToolInvocation::new(
        &tools.luisgen_cmd,
        [
            artifact.to_string_lossy().into_owned(),
            config.lg_language.generator_flag().to_string(),
            tools.binding_class.clone(),
            "-o".to_string(),
            config.lg_out_folder.to_string_lossy().into_owned(),
        ],
    );
    run_tool(runner, stage, &invocation).await?;

    info!(
        lg_out_folder = %config.lg_out_folder.display(),
        class = %tools.binding_class,
        "bindings regenerated"
    );
    Ok(config.lg_out_folder.clone())
}

async fn run_tool<R: ToolRunner>(
    runner: &R,
    stage: RefreshStage,
    invocation: &ToolInvocation,
) -> Result<ToolOutput> {
    info!(command = %invocation, "running {stage}");

    let output = runner.run(invocation).await.map_err(|e| {
        BotSkillsError::orchestration(
            stage,
            format!("failed to run `{}`: {e}. Is it installed?", invocation.program),
        )
    })?;

    if !output.stdout.trim().is_empty() {
        debug!(stdout = %output.stdout.trim(), "{} output", invocation.program);
    }

    if !output.success {
        let code = output
            .code
            .map_or_else(|| "a signal".to_string(), |c| format!("exit code {c}"));
        return Err(BotSkillsError::orchestration(
            stage,
            format!("`{invocation}` exited with {code}: {}", output.stderr.trim()),
        ));
    }

    if !output.stderr.trim().is_empty() {
        warn!(stderr = %output.stderr.trim(), "{} wrote to stderr", invocation.program);
    }

    Ok(output)
}

/// Service names and ids listed in a `.dispatch` file.
fn dispatch_services(source: &str, path: &Path) -> Result<HashSet<String>> {
    let document: serde_json::Value =
        serde_json::from_str(source).map_err(|e| BotSkillsError::parse(path, e.to_string()))?;

    let services: HashSet<String> = document
        .get("services")
        .and_then(|s| s.as_array())
        .map(|entries| {
            entries
                .iter()
                .flat_map(|service| {
                    ["name", "id"]
                        .into_iter()
                        .filter_map(move |field| service.get(field).and_then(|v| v.as_str()))
                })
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default();

    Ok(services)
}

fn unregistered_models(models: &[LanguageModel], services: &HashSet<String>) -> Vec<String> {
    models
        .iter()
        .filter(|m| {
            !services.contains(&m.key().to_lowercase())
                && !services.contains(&m.name.to_lowercase())
        })
        .map(|m| m.key().to_string())
        .collect()
}

/// Digest of the artifact currently on disk, if it can be read.
async fn previous_digest(artifact: &Path) -> Option<String> {
    match tokio::fs::read(artifact).await {
        Ok(bytes) => Some(sha256_hex(&bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(
                artifact = %artifact.display(),
                error = %e,
                "cannot read existing dispatch model; it will be reported as changed"
            );
            None
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
