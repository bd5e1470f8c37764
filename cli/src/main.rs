use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use cmdoc_config::{FailOn, MergeConfig, SourceEntry, load_sources, select_command};
use cmdoc_core::{CommandModel, MergeOutcome, merge_sources, update_from_live, validate_model};
use cmdoc_markdown::{LexicalMode, parse_command_file};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code used when merge diagnostics reach the configured severity.
const EXIT_DIAGNOSTICS: i32 = 2;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliMode {
    Full,
    FormattingPreserve,
}

impl From<CliMode> for LexicalMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Full => Self::Full,
            CliMode::FormattingPreserve => Self::FormattingPreserve,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFailOn {
    Error,
    Warning,
    Never,
}

impl From<CliFailOn> for FailOn {
    fn from(fail_on: CliFailOn) -> Self {
        match fail_on {
            CliFailOn::Error => Self::Error,
            CliFailOn::Warning => Self::Warning,
            CliFailOn::Never => Self::Never,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "cmdoc")]
#[command(about = "Compile, merge and update Markdown command references")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a Markdown document into command models.
    Parse(ParseArgs),
    /// Merge the same command documented for several sources.
    Merge(MergeArgs),
    /// Refresh an authored document from a live command model.
    Update(UpdateArgs),
    /// Check that documents parse and their models are consistent.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Markdown document to parse.
    #[arg(long)]
    input: PathBuf,
    /// Lexical mode.
    #[arg(long, default_value = "full")]
    mode: CliMode,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// YAML merge configuration listing the sources.
    #[arg(long, conflicts_with = "sources")]
    config: Option<PathBuf>,
    /// Source given as ID=FILE; repeat in merge order.
    #[arg(long = "source", value_name = "ID=FILE", required_unless_present = "config")]
    sources: Vec<String>,
    /// Command to select from multi-command documents.
    #[arg(long)]
    command: Option<String>,
    /// Lexical mode (overrides the configuration).
    #[arg(long)]
    mode: Option<CliMode>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Write a Markdown change report to this file.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Diagnostic severity that fails the run (overrides the configuration).
    #[arg(long)]
    fail_on: Option<CliFailOn>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Authored Markdown document.
    #[arg(long)]
    authored: PathBuf,
    /// Live command model as JSON.
    #[arg(long)]
    live: PathBuf,
    /// Command to select from a multi-command authored document.
    #[arg(long)]
    command: Option<String>,
    /// Lexical mode used for the authored document.
    #[arg(long, default_value = "full")]
    mode: CliMode,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Write a Markdown change report to this file.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Markdown documents to check.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Lexical mode.
    #[arg(long, default_value = "full")]
    mode: CliMode,
}

/// Result of a merge run that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeStatus {
    Clean,
    ThresholdReached,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Merge(args) => match run_merge(args) {
            Ok(MergeStatus::ThresholdReached) => std::process::exit(EXIT_DIAGNOSTICS),
            other => other.map(|_| ()),
        },
        Command::Update(args) => run_update(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: failed to install log subscriber: {err}");
    }
}

// ---------------------------------------------------------------------------
// parse / validate
// ---------------------------------------------------------------------------

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let models = read_models(&args.input, args.mode.into())?;
    info!(input = %args.input.display(), commands = models.len(), "Parsed document");
    println!("{}", format_output(&models, args.format)?);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mode = LexicalMode::from(args.mode);
    let mut commands = 0;
    let mut failures = 0;

    for input in &args.inputs {
        let models = match read_models(input, mode) {
            Ok(models) => models,
            Err(err) => {
                eprintln!("{err}");
                failures += 1;
                continue;
            }
        };
        for model in &models {
            commands += 1;
            for error in validate_model(model) {
                eprintln!("{}: {}: {error}", input.display(), model.name);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} validation problem(s) found"));
    }
    println!(
        "Validated {} document(s) for {commands} command(s).",
        args.inputs.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// merge / update
// ---------------------------------------------------------------------------

fn run_merge(args: MergeArgs) -> Result<MergeStatus, String> {
    let mut config = match &args.config {
        Some(path) => MergeConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => {
            let entries = args
                .sources
                .iter()
                .map(|pair| SourceEntry::parse_pair(pair))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?;
            MergeConfig::new(entries)
        }
    };
    if args.command.is_some() {
        config.command = args.command.clone();
    }
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(fail_on) = args.fail_on {
        config.fail_on = fail_on.into();
    }
    config.validate().map_err(|e| e.to_string())?;

    let loaded = load_sources(&config).map_err(|e| e.to_string())?;
    let sources: Vec<_> = loaded.iter().map(|source| source.as_merge_source()).collect();
    let outcome = merge_sources(&sources);
    info!(
        command = %outcome.model.name,
        sources = sources.len(),
        diagnostics = outcome.diagnostics.len(),
        "Merged sources"
    );

    emit_outcome(&outcome, args.format, args.report.as_deref())?;

    let worst = outcome.max_severity();
    if config.fail_on.is_reached(worst) {
        warn!(?worst, fail_on = ?config.fail_on, "Merge diagnostics reached failure threshold");
        return Ok(MergeStatus::ThresholdReached);
    }
    Ok(MergeStatus::Clean)
}

fn run_update(args: UpdateArgs) -> Result<(), String> {
    let models = read_models(&args.authored, args.mode.into())?;
    let authored = select_command(
        &args.authored.display().to_string(),
        models,
        args.command.as_deref(),
    )
    .map_err(|e| e.to_string())?;

    let live_text = fs::read_to_string(&args.live)
        .map_err(|err| format!("Failed to read '{}': {err}", args.live.display()))?;
    let live: CommandModel = serde_json::from_str(&live_text)
        .map_err(|err| format!("Invalid live model '{}': {err}", args.live.display()))?;

    let outcome = update_from_live(&authored, &live);
    info!(
        command = %outcome.model.name,
        diagnostics = outcome.diagnostics.len(),
        "Updated from live model"
    );
    emit_outcome(&outcome, args.format, args.report.as_deref())
}

fn emit_outcome(
    outcome: &MergeOutcome,
    format: CliOutputFormat,
    report: Option<&Path>,
) -> Result<(), String> {
    if let Some(path) = report {
        fs::write(path, outcome.report())
            .map_err(|err| format!("Failed to write report '{}': {err}", path.display()))?;
    }
    println!("{}", format_output(outcome, format)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn read_models(path: &Path, mode: LexicalMode) -> Result<Vec<CommandModel>, String> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    parse_command_file(&path.display().to_string(), &text, mode).map_err(|err| err.to_string())
}

fn format_output<T: Serialize + ?Sized>(value: &T, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_merge_requires_config_or_source() {
        assert!(Cli::try_parse_from(["cmdoc", "merge"]).is_err());
        assert!(Cli::try_parse_from(["cmdoc", "merge", "--source", "a=a.md"]).is_ok());
        assert!(
            Cli::try_parse_from(["cmdoc", "merge", "--config", "c.yml", "--source", "a=a.md"])
                .is_err()
        );
    }

    #[test]
    fn test_mode_values() {
        let cli = Cli::try_parse_from([
            "cmdoc",
            "parse",
            "--input",
            "x.md",
            "--mode",
            "formatting-preserve",
        ])
        .unwrap();
        let Command::Parse(args) = cli.command else {
            panic!("expected parse");
        };
        assert_eq!(LexicalMode::from(args.mode), LexicalMode::FormattingPreserve);
    }
}
