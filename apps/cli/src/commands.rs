//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use leadscrub_classifier::LeadClassifier;
use leadscrub_core::processor::{ProgressReporter, RunConfig, run_dataset_task};
use leadscrub_delivery::{DriveUploader, Notifier};
use leadscrub_mx::MxClassifier;
use leadscrub_shared::{
    AppConfig, ClassifierConfig, DriveConfig, LookupConfig, NotifyConfig, RunReport, init_config,
    load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// leadscrub — enrich sales-lead CSVs and ship the result.
#[derive(Parser)]
#[command(
    name = "leadscrub",
    version,
    about = "Enrich a lead-list CSV with LLM classification, bundling, and provider lookups.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Process a lead-list CSV end to end.
    Run {
        /// Path to the input CSV file (UTF-8).
        input: PathBuf,

        /// Prompt template with the [POSICION] placeholder, inline.
        #[arg(short, long, conflicts_with = "prompt_file")]
        prompt: Option<String>,

        /// Read the prompt template from a file instead.
        #[arg(long)]
        prompt_file: Option<PathBuf>,

        /// Display filename for the uploaded artifact (defaults to the
        /// input file's name).
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadscrub=info",
        1 => "leadscrub=debug",
        _ => "leadscrub=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            input,
            prompt,
            prompt_file,
            name,
        } => cmd_run(&input, prompt.as_deref(), prompt_file.as_deref(), name.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(
    input: &Path,
    prompt: Option<&str>,
    prompt_file: Option<&Path>,
    name: Option<&str>,
) -> Result<()> {
    let config = load_config()?;

    // Resolve secrets up front so a missing key fails before any work.
    let classifier_config = ClassifierConfig::from_config(&config)?;
    let drive_config = DriveConfig::from_config(&config)?;
    let notify_config = NotifyConfig::from_config(&config)?;
    let lookup_config = LookupConfig::from(&config);

    let csv_data = std::fs::read_to_string(input)
        .map_err(|e| eyre!("cannot read input CSV '{}': {e}", input.display()))?;

    let prompt_template = match (prompt, prompt_file) {
        (Some(p), _) => p.to_string(),
        (None, Some(f)) => std::fs::read_to_string(f)
            .map_err(|e| eyre!("cannot read prompt file '{}': {e}", f.display()))?,
        (None, None) => return Err(eyre!("provide a prompt with --prompt or --prompt-file")),
    };

    let file_name = name.map(String::from).unwrap_or_else(|| {
        input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "leads.csv".to_string())
    });

    let run_config = RunConfig {
        file_name: file_name.clone(),
        prompt_template,
        lookup_delay: lookup_config.delay,
    };

    let mx = MxClassifier::new(&lookup_config)?;
    let classifier = LeadClassifier::new(classifier_config)?;
    let uploader = DriveUploader::new(drive_config)?;
    let notifier = Notifier::new(notify_config)?;

    info!(input = %input.display(), file_name, "processing lead list");

    let reporter = CliProgress::new();

    let report = run_dataset_task(
        &csv_data,
        &run_config,
        &mx,
        &classifier,
        &uploader,
        &notifier,
        &reporter,
    )
    .await?;

    // Print summary
    println!();
    println!("  Lead list processed successfully!");
    println!("  File:    {}", report.file_name);
    println!("  Rows:    {} ({} skipped)", report.rows_processed, report.rows_skipped);
    println!("  Link:    {}", report.artifact_link);
    println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn row_processed(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Enriching [{current}/{total}]"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

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
