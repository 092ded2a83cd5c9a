// crates/atomic-index-cli/src/main.rs
// ============================================================================
// Module: Atomic Index CLI Entry Point
// Description: Command-line front end for the atomic test indexer.
// Purpose: Load configuration, run one indexing pass, and report the outcome.
// Dependencies: clap, atomic-index-config, atomic-index-core, thiserror.
// ============================================================================

//! ## Overview
//! `atomic-index <INPUT_DIRECTORY> <OUTPUT_FILE>` scans the input tree for
//! technique files, merges their linux tests into the output index, and
//! prints a one-line summary. Every failure is reported on stderr through the
//! i18n catalog and exits non-zero.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use atomic_index_cli::i18n::Locale;
use atomic_index_cli::i18n::set_locale;
use atomic_index_cli::t;
use atomic_index_config::AtomicIndexConfig;
use atomic_index_config::EventSinkKind;
use atomic_index_config::LoggingConfig;
use atomic_index_core::FileEventSink;
use atomic_index_core::NoopEventSink;
use atomic_index_core::RunEventSink;
use atomic_index_core::RunSummary;
use atomic_index_core::StderrEventSink;
use clap::ArgAction;
use clap::Parser;
use clap::ValueEnum;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "ATOMIC_INDEX_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "atomic-index", disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue)]
    show_version: bool,
    /// Preferred output language (overrides `ATOMIC_INDEX_LANG`).
    #[arg(long, value_enum, value_name = "LANG")]
    lang: Option<LangArg>,
    /// Config file path (overrides `ATOMIC_INDEX_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory scanned recursively for technique files.
    #[arg(value_name = "INPUT_DIRECTORY", required_unless_present = "show_version")]
    input: Option<PathBuf>,
    /// Index file created or updated by the run.
    #[arg(value_name = "OUTPUT_FILE", required_unless_present = "show_version")]
    output: Option<PathBuf>,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Parses arguments and executes one indexing run.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let (Some(input), Some(output)) = (cli.input, cli.output) else {
        return Err(CliError::new(t!("run.args_missing")));
    };

    let config = AtomicIndexConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let sink = build_event_sink(&config.logging)?;
    let summary = command_index(&input, &output, &config, sink.as_ref())?;
    write_stdout_line(&render_summary(&summary))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Index Command
// ============================================================================

/// Runs the indexing pipeline with options taken from `config`.
fn command_index(
    input: &Path,
    output: &Path,
    config: &AtomicIndexConfig,
    sink: &dyn RunEventSink,
) -> CliResult<RunSummary> {
    atomic_index_core::run(input, output, &config.run_options(), sink)
        .map_err(|err| CliError::new(t!("run.failed", error = err)))
}

/// Formats the success summary line.
fn render_summary(summary: &RunSummary) -> String {
    t!(
        "run.summary",
        files = summary.files_scanned,
        techniques = summary.techniques_matched,
        added_techniques = summary.techniques_added,
        tests = summary.tests_added,
        skipped = summary.duplicates_skipped
    )
}

/// Builds the run event sink selected by the logging config.
fn build_event_sink(logging: &LoggingConfig) -> CliResult<Box<dyn RunEventSink>> {
    match (logging.sink, logging.path.as_deref()) {
        (EventSinkKind::Stderr, _) => Ok(Box::new(StderrEventSink)),
        (EventSinkKind::File, Some(path)) => FileEventSink::new(path)
            .map(|sink| Box::new(sink) as Box<dyn RunEventSink>)
            .map_err(|err| {
                CliError::new(t!("logging.open_failed", path = path.display(), error = err))
            }),
        (EventSinkKind::File | EventSinkKind::None, _) => Ok(Box::new(NoopEventSink)),
    }
}

// ============================================================================
// SECTION: Locale Helpers
// ============================================================================

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
