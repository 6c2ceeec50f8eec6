//! CLI command definitions, routing, and tracing setup.

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use botskills_core::refresh::{ProcessRunner, RefreshProgress, RefreshReport};
use botskills_shared::{AppConfig, RefreshOverrides, RefreshStage, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// botskills: keep an assistant's dispatcher in sync with its connected skills.
#[derive(Parser, Debug)]
#[command(
    name = "botskills",
    version,
    about = "Manage the skills connected to a conversational assistant.",
    long_about = None,
    subcommand_required = true,
    arg_required_else_help = true,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Output detailed information about the processing of the tool.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Refresh the connected skills.
    #[command(arg_required_else_help = true)]
    Refresh(RefreshArgs),

    /// Tool configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `botskills refresh`.
#[derive(Args, Debug, Default)]
pub(crate) struct RefreshArgs {
    /// Determine your assistant project structure to be a CSharp-like structure.
    #[arg(long)]
    pub cs: bool,

    /// Determine your assistant project structure to be a TypeScript-like structure.
    #[arg(long)]
    pub ts: bool,

    /// Name of your assistant's '.dispatch' file (defaults to the name in your cognitive models file).
    #[arg(long = "dispatchName", value_name = "NAME")]
    pub dispatch_name: Option<String>,

    /// Locale used for LUIS culture (defaults to 'en-us').
    #[arg(long, value_name = "LOCALE")]
    pub language: Option<String>,

    /// Folder containing your assistant's '.dispatch' file (defaults to './Deployment/Resources/Dispatch/<lang>').
    #[arg(long = "dispatchFolder", value_name = "PATH")]
    pub dispatch_folder: Option<String>,

    /// Path for any output file that may be generated (defaults to your assistant's root folder).
    #[arg(long = "outFolder", value_name = "PATH")]
    pub out_folder: Option<String>,

    /// Path for the generated binding classes (defaults to a 'Services' folder inside your assistant).
    #[arg(long = "lgOutFolder", value_name = "PATH")]
    pub lg_out_folder: Option<String>,

    /// Path to your cognitive models file (defaults to 'cognitivemodels.json' inside your assistant).
    #[arg(long = "cognitiveModelsFile", value_name = "PATH")]
    pub cognitive_models_file: Option<String>,
}

impl From<RefreshArgs> for RefreshOverrides {
    fn from(args: RefreshArgs) -> Self {
        Self {
            cs: args.cs,
            ts: args.ts,
            dispatch_name: args.dispatch_name,
            language: args.language,
            dispatch_folder: args.dispatch_folder,
            out_folder: args.out_folder,
            lg_out_folder: args.lg_out_folder,
            cognitive_models_file: args.cognitive_models_file,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved tool configuration.
    Show,
}

/// Exit code for a clap parse error: 0 for help/version, 1 otherwise.
pub(crate) fn parse_error_exit_code(kind: clap::error::ErrorKind) -> i32 {
    use clap::error::ErrorKind;

    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

/// Print a clap parse error and exit with [`parse_error_exit_code`].
pub(crate) fn exit_on_parse_error(err: clap::Error) -> ! {
    let code = parse_error_exit_code(err.kind());
    let _ = err.print();
    std::process::exit(code);
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if cli.verbose {
        "botskills=debug"
    } else {
        "botskills=info"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Refresh(args) => cmd_refresh(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_refresh(args: RefreshArgs) -> Result<()> {
    let cwd = std::env::current_dir()
        .map_err(|e| eyre!("cannot determine working directory: {e}"))?;

    let overrides = RefreshOverrides::from(args);

    // Flag validation happens before any file is touched
    let paths = botskills_shared::resolve(&overrides, &cwd)?;
    let app: AppConfig = load_config()?;

    let models =
        botskills_core::manifest::read_cognitive_models(&paths.cognitive_models_file).await?;
    let configuration = botskills_core::assembler::assemble(paths, &models)?;

    info!(
        dispatch_name = %configuration.dispatch_name,
        language = %configuration.language,
        lg_language = %configuration.lg_language,
        "refreshing dispatcher"
    );

    let runner = ProcessRunner::new(&configuration.out_folder);
    let reporter = CliProgress::new();

    let report =
        botskills_core::refresh::refresh(&configuration, &app.tools, &runner, &reporter).await?;

    // Print summary
    println!();
    println!("  Successfully refreshed Dispatch model");
    println!("  Dispatch: {}", report.dispatch_name);
    println!("  Language: {} ({})", report.language, report.lg_language);
    println!("  Model:    {}", report.model_artifact.display());
    println!(
        "  Changed:  {}",
        if report.model_changed { "yes" } else { "no" }
    );
    println!("  Bindings: {}", report.lg_out_folder.display());
    if !report.unregistered_models.is_empty() {
        println!(
            "  Not in dispatch: {}",
            report.unregistered_models.join(", ")
        );
    }
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl RefreshProgress for CliProgress {
    fn stage(&self, stage: RefreshStage) {
        let message = match stage {
            RefreshStage::RebuildDispatchModel => "Running dispatch refresh...",
            RefreshStage::RegenerateBindings => "Running LuisGen...",
        };
        self.spinner.set_message(message);
    }

    fn failed(&self, _stage: RefreshStage) {
        self.spinner.finish_and_clear();
    }

    fn done(&self, _report: &RefreshReport) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
