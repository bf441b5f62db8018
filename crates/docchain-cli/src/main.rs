// crates/docchain-cli/src/main.rs
// ============================================================================
// Module: DocChain CLI Entry Point
// Description: Command dispatcher for the document registry.
// Purpose: Register, anchor, and verify documents from the command line.
// Dependencies: clap, docchain-config, docchain-core, docchain-store-sqlite
// ============================================================================

//! ## Overview
//! `docchain` opens the configured store, runs one registry operation, prints
//! the result as canonical JSON on stdout, and records one operation log
//! line. `verify` exits with a failure code when the presented file does not
//! verify, so scripts can branch on the exit status alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use docchain_cli::OperationLogEvent;
use docchain_cli::OperationLogSink;
use docchain_cli::OperationOutcome;
use docchain_cli::build_sink;
use docchain_config::DocchainConfig;
use docchain_config::config_toml_example;
use docchain_core::Clock;
use docchain_core::InMemoryRegistry;
use docchain_core::RegisterRequest;
use docchain_core::RegistryEngine;
use docchain_core::RegistryError;
use docchain_core::SharedRegistryBackend;
use docchain_core::SystemClock;
use docchain_core::VerifyRequest;
use docchain_core::hashing::canonical_json_bytes;
use docchain_store_sqlite::SqliteRegistryStore;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "docchain", version, disable_help_subcommand = true)]
struct Cli {
    /// Optional config file path (defaults to docchain.toml or `DOCCHAIN_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Registry operations.
    #[command(flatten)]
    Registry(RegistryCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Commands that run against the registry.
#[derive(Subcommand, Debug)]
enum RegistryCommand {
    /// Fingerprint a file and register it.
    Register(RegisterCommand),
    /// Record a confirmed external anchor for a document.
    ConfirmAnchor(ConfirmAnchorCommand),
    /// Verify a file against the registry.
    Verify(VerifyCommand),
    /// List registered documents, newest first.
    Documents,
    /// Show a single document.
    Show(ShowCommand),
    /// Show recent audit events, newest first.
    History(HistoryCommand),
    /// Show registry statistics.
    Stats,
}

/// Arguments for `register`.
#[derive(Args, Debug)]
struct RegisterCommand {
    /// File to register.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Display name (defaults to the file's own name).
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
    /// Owner label.
    #[arg(long, value_name = "OWNER")]
    owner: Option<String>,
    /// Caller-chosen document id.
    #[arg(long, value_name = "ID")]
    document_id: Option<String>,
}

/// Arguments for `confirm-anchor`.
#[derive(Args, Debug)]
struct ConfirmAnchorCommand {
    /// Document to anchor.
    #[arg(long, value_name = "ID")]
    document_id: String,
    /// External transaction id.
    #[arg(long, value_name = "TX")]
    tx_id: String,
    /// Block number of the transaction.
    #[arg(long, value_name = "N")]
    block_number: Option<u64>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// File to verify.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Claimed document id; omitted means lookup by content.
    #[arg(long, value_name = "ID")]
    document_id: Option<String>,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
struct ShowCommand {
    /// Document to show.
    #[arg(long, value_name = "ID")]
    document_id: String,
}

/// Arguments for `history`.
#[derive(Args, Debug)]
struct HistoryCommand {
    /// Maximum number of events (defaults to `registry.history_limit`).
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a docchain configuration file.
    Validate,
    /// Print an example configuration with every default spelled out.
    Example,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Top-level CLI error carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Failure of a single registry command.
#[derive(Debug, Error)]
enum CommandError {
    /// Engine rejected or failed the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Input file could not be opened.
    #[error("failed to open {path}: {error}")]
    Input {
        /// Path the caller supplied.
        path: String,
        /// Underlying I/O error.
        error: std::io::Error,
    },
    /// Result could not be serialized.
    #[error("failed to serialize output: {0}")]
    Output(String),
}

impl CommandError {
    /// Returns the operation log error class.
    fn kind_label(&self) -> &'static str {
        match self {
            Self::Registry(err) => err.kind().as_str(),
            Self::Input {
                ..
            } => "read",
            Self::Output(_) => "output",
        }
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Engine over a type-erased backend.
type Engine = RegistryEngine<SharedRegistryBackend, SystemClock>;

/// Successful command result.
struct Completed {
    /// Canonical JSON payload for stdout.
    payload: Vec<u8>,
    /// Outcome reported to the operation log.
    outcome: OperationOutcome,
    /// Document the command concerned.
    document_id: Option<String>,
    /// Extra detail for the operation log.
    detail: Option<String>,
}

impl Completed {
    /// Serializes `value` into a succeeded result.
    fn succeeded<T: Serialize>(
        value: &T,
        document_id: Option<String>,
    ) -> Result<Self, CommandError> {
        Ok(Self {
            payload: to_canonical_json(value)?,
            outcome: OperationOutcome::Succeeded,
            document_id,
            detail: None,
        })
    }
}

/// Opens the configured backends and builds an engine.
fn open_engine(config: &DocchainConfig) -> CliResult<Engine> {
    let backend = match config.sqlite_store_config() {
        Some(sqlite) => {
            let store = SqliteRegistryStore::new(&sqlite).map_err(|err| {
                CliError::new(format!("failed to open store {}: {err}", sqlite.path.display()))
            })?;
            SharedRegistryBackend::new(store)
        }
        None => {
            SharedRegistryBackend::new(InMemoryRegistry::with_retention(config.audit.retention))
        }
    };
    Ok(RegistryEngine::new(backend, SystemClock, config.engine_config()))
}

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

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Config {
            command,
        } => command_config(&command, cli.config.as_deref()),
        Commands::Registry(command) => command_registry(command, cli.config.as_deref()),
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes config subcommands.
fn command_config(command: &ConfigCommand, path: Option<&Path>) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            let config = DocchainConfig::load(path)
                .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
            let source = config
                .source_path
                .as_ref()
                .map_or_else(|| "built-in defaults".to_string(), |path| path.display().to_string());
            write_stdout_line(&format!("config valid: {source}"))
                .map_err(|err| CliError::new(output_error(&err)))?;
        }
        ConfigCommand::Example => {
            write_stdout_bytes(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error(&err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Registry Commands
// ============================================================================

/// Runs a registry command and records its operation log line.
fn command_registry(command: RegistryCommand, path: Option<&Path>) -> CliResult<ExitCode> {
    let config = DocchainConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let sink = build_sink(&config.logging)
        .map_err(|err| CliError::new(format!("failed to open operation log: {err}")))?;
    let operation = operation_name(&command);
    let requested_id = requested_document_id(&command);
    let engine = match open_engine(&config) {
        Ok(engine) => engine,
        Err(err) => {
            sink.record(&OperationLogEvent::failed(
                SystemClock.now(),
                operation,
                requested_id,
                "storage",
                err.to_string(),
            ));
            return Err(err);
        }
    };

    match execute(&engine, &config, command) {
        Ok(completed) => finish(sink.as_ref(), operation, completed),
        Err(err) => {
            let event = OperationLogEvent::failed(
                SystemClock.now(),
                operation,
                requested_id,
                err.kind_label(),
                err.to_string(),
            );
            sink.record(&event);
            Err(CliError::new(err.to_string()))
        }
    }
}

/// Writes a completed result and records its log line.
fn finish(
    sink: &dyn OperationLogSink,
    operation: &str,
    mut completed: Completed,
) -> CliResult<ExitCode> {
    completed.payload.push(b'\n');
    write_stdout_bytes(&completed.payload).map_err(|err| CliError::new(output_error(&err)))?;
    sink.record(&OperationLogEvent::completed(
        SystemClock.now(),
        operation,
        completed.outcome,
        completed.document_id,
        completed.detail,
    ));
    match completed.outcome {
        OperationOutcome::Succeeded => Ok(ExitCode::SUCCESS),
        OperationOutcome::NotVerified | OperationOutcome::Failed => Ok(ExitCode::FAILURE),
    }
}

/// Executes one registry command against `engine`.
fn execute(
    engine: &Engine,
    config: &DocchainConfig,
    command: RegistryCommand,
) -> Result<Completed, CommandError> {
    match command {
        RegistryCommand::Register(command) => {
            let file_name = command.name.unwrap_or_else(|| display_name(&command.file));
            let reader = open_input(&command.file)?;
            let registration = engine.register(RegisterRequest {
                reader,
                file_name,
                owner: command.owner,
                document_id: command.document_id,
            })?;
            let document_id = registration.record.document_id.as_str().to_string();
            Completed::succeeded(&registration, Some(document_id))
        }
        RegistryCommand::ConfirmAnchor(command) => {
            let confirmation = engine.confirm_anchor(
                &command.document_id,
                &command.tx_id,
                command.block_number,
            )?;
            let document_id = confirmation.document_id.as_str().to_string();
            Completed::succeeded(&confirmation, Some(document_id))
        }
        RegistryCommand::Verify(command) => {
            let reader = open_input(&command.file)?;
            let outcome = engine.verify(VerifyRequest {
                reader,
                document_id: command.document_id,
            })?;
            Ok(Completed {
                payload: to_canonical_json(&outcome)?,
                outcome: if outcome.verified {
                    OperationOutcome::Succeeded
                } else {
                    OperationOutcome::NotVerified
                },
                document_id: outcome.document_id.as_ref().map(|id| id.as_str().to_string()),
                detail: Some(outcome.reason.as_str().to_string()),
            })
        }
        RegistryCommand::Documents => Completed::succeeded(&engine.list_documents()?, None),
        RegistryCommand::Show(command) => {
            let record = engine.get_document(&command.document_id)?;
            let document_id = record.document_id.as_str().to_string();
            Completed::succeeded(&record, Some(document_id))
        }
        RegistryCommand::History(command) => {
            let limit = command.limit.unwrap_or(config.registry.history_limit);
            Completed::succeeded(&engine.recent_history(limit)?, None)
        }
        RegistryCommand::Stats => Completed::succeeded(&engine.get_stats()?, None),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the operation log name for a command.
const fn operation_name(command: &RegistryCommand) -> &'static str {
    match command {
        RegistryCommand::Register(_) => "register",
        RegistryCommand::ConfirmAnchor(_) => "confirm_anchor",
        RegistryCommand::Verify(_) => "verify",
        RegistryCommand::Documents => "documents",
        RegistryCommand::Show(_) => "show",
        RegistryCommand::History(_) => "history",
        RegistryCommand::Stats => "stats",
    }
}

/// Returns the document id supplied on the command line, if any.
fn requested_document_id(command: &RegistryCommand) -> Option<String> {
    let raw = match command {
        RegistryCommand::Register(command) => command.document_id.as_deref(),
        RegistryCommand::ConfirmAnchor(command) => Some(command.document_id.as_str()),
        RegistryCommand::Verify(command) => command.document_id.as_deref(),
        RegistryCommand::Show(command) => Some(command.document_id.as_str()),
        RegistryCommand::Documents | RegistryCommand::History(_) | RegistryCommand::Stats => None,
    };
    raw.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

/// Opens an input file for fingerprinting.
fn open_input(path: &Path) -> Result<File, CommandError> {
    File::open(path).map_err(|error| CommandError::Input {
        path: path.display().to_string(),
        error,
    })
}

/// Returns the final component of `path` as a display name.
fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Serializes a value as canonical JSON.
fn to_canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CommandError> {
    canonical_json_bytes(value).map_err(|err| CommandError::Output(err.to_string()))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a stdout write failure.
fn output_error(error: &std::io::Error) -> String {
    format!("failed to write to stdout: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
