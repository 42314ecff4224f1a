// crates/gift-ledger-cli/src/main.rs
// ============================================================================
// Module: Gift Ledger CLI Entry Point
// Description: Command dispatcher for ledger migrations and event inspection.
// Purpose: Provide a safe, localized CLI over the configured ledger store.
// Dependencies: clap, gift-ledger-config, gift-ledger-core, gift-ledger-store-sqlite, serde
// ============================================================================

//! ## Overview
//! The gift ledger CLI applies recorded migrations, reports migration state,
//! validates configuration, and prints a gift card's event history as JSON
//! lines. All user-facing strings are routed through the i18n catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use gift_ledger_cli::t;
use gift_ledger_config::LedgerConfig;
use gift_ledger_core::EventStore;
use gift_ledger_core::GiftCardEvent;
use gift_ledger_core::GiftCardId;
use gift_ledger_store_sqlite::AppliedMigration;
use gift_ledger_store_sqlite::SqliteLedgerStore;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "gift-ledger", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations and print a JSON report.
    Migrate(ConfigArgs),
    /// Migration state utilities.
    Migrations {
        /// Selected migrations subcommand.
        #[command(subcommand)]
        command: MigrationsCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Gift card event utilities.
    Events {
        /// Selected events subcommand.
        #[command(subcommand)]
        command: EventsCommand,
    },
}

/// Migration state subcommands.
#[derive(Subcommand, Debug)]
enum MigrationsCommand {
    /// List applied and pending migrations.
    List(ConfigArgs),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a gift ledger configuration file.
    Validate(ConfigArgs),
}

/// Events subcommands.
#[derive(Subcommand, Debug)]
enum EventsCommand {
    /// Print every event of one gift card as JSON lines, oldest first.
    List(EventsListCommand),
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to gift-ledger.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for event listing.
#[derive(Args, Debug)]
struct EventsListCommand {
    /// Gift card identifier.
    #[arg(long = "gift-card", value_name = "ID")]
    gift_card: u64,
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Applied and pending migration names.
#[derive(Debug, Serialize)]
struct MigrationState {
    /// Applied migrations in application order.
    applied: Vec<AppliedMigration>,
    /// Pending migration names in application order.
    pending: Vec<&'static str>,
}

/// One event rendered as a JSON line.
#[derive(Debug, Serialize)]
struct EventLine {
    /// Event identifier.
    id: u64,
    /// Gift card identifier.
    gift_card_id: u64,
    /// Event kind label.
    kind: &'static str,
    /// Attributed user, if any.
    user_id: Option<u64>,
    /// Attributed app, if any.
    app_id: Option<u64>,
    /// Kind-specific parameter mapping.
    parameters: Value,
    /// Creation time (unix ms).
    created_at: i64,
}

impl EventLine {
    /// Renders a stored event.
    fn from_event(event: &GiftCardEvent) -> CliResult<Self> {
        let parameters = event
            .payload
            .parameters()
            .map_err(|err| CliError::new(t!("output.serialize_failed", error = err)))?;
        Ok(Self {
            id: event.id.get(),
            gift_card_id: event.gift_card_id.get(),
            kind: event.kind().as_str(),
            user_id: event.actor.user().map(|id| id.get()),
            app_id: event.actor.app().map(|id| id.get()),
            parameters,
            created_at: event.created_at.as_unix_millis(),
        })
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

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(stdout_error(&err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Migrate(args) => command_migrate(&args),
        Commands::Migrations {
            command,
        } => command_migrations(command),
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Events {
            command,
        } => command_events(command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(stdout_error(&err)))?;
    write_stdout_line("").map_err(|err| CliError::new(stdout_error(&err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Migration Commands
// ============================================================================

/// Applies pending migrations and prints the run report.
fn command_migrate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let store = open_store(&config, "migrate")?;
    let migrator = config
        .batch_migrator()
        .map_err(|err| CliError::new(t!("migrate.setup_failed", error = err)))?;
    let report = store
        .migrate(&migrator)
        .map_err(|err| CliError::new(t!("migrate.failed", error = err)))?;
    write_json_line(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches migration state subcommands.
fn command_migrations(command: MigrationsCommand) -> CliResult<ExitCode> {
    match command {
        MigrationsCommand::List(args) => command_migrations_list(&args),
    }
}

/// Prints applied and pending migrations.
fn command_migrations_list(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let store = open_store(&config, "migrations list")?;
    let state = migration_state(&store)?;
    write_json_line(&state)?;
    Ok(ExitCode::SUCCESS)
}

/// Reads migration bookkeeping from the store.
fn migration_state(store: &SqliteLedgerStore) -> CliResult<MigrationState> {
    let list_failed = |err: gift_ledger_store_sqlite::SqliteStoreError| {
        CliError::new(t!("migrations.list_failed", error = err))
    };
    Ok(MigrationState {
        applied: store.applied_migrations().map_err(list_failed)?,
        pending: store.pending_migrations().map_err(list_failed)?,
    })
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => command_config_validate(&args),
    }
}

/// Executes the config validation command.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let _config = load_config(args)?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(stdout_error(&err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Event Commands
// ============================================================================

/// Dispatches events subcommands.
fn command_events(command: EventsCommand) -> CliResult<ExitCode> {
    match command {
        EventsCommand::List(command) => command_events_list(&command),
    }
}

/// Prints one gift card's events as JSON lines.
fn command_events_list(command: &EventsListCommand) -> CliResult<ExitCode> {
    let gift_card_id = GiftCardId::from_raw(command.gift_card)
        .ok_or_else(|| CliError::new(t!("events.gift_card_invalid")))?;
    let config = load_config(&command.config)?;
    let store = open_store(&config, "events list")?;
    let events = store.events_for_gift_card(gift_card_id).map_err(|err| {
        CliError::new(t!("events.load_failed", id = gift_card_id, error = err))
    })?;
    for event in &events {
        write_json_line(&EventLine::from_event(event)?)?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Store Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(args: &ConfigArgs) -> CliResult<LedgerConfig> {
    LedgerConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Opens the configured `SQLite` store; other backends are rejected.
fn open_store(config: &LedgerConfig, command: &str) -> CliResult<SqliteLedgerStore> {
    let sqlite = config
        .store
        .sqlite()
        .ok_or_else(|| CliError::new(t!("store.sqlite_required", command = command)))?;
    let path = sqlite.path.display().to_string();
    SqliteLedgerStore::new(sqlite)
        .map_err(|err| CliError::new(t!("store.open_failed", path = path, error = err)))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Serializes `value` as compact JSON and writes it as one stdout line.
fn write_json_line<T: Serialize>(value: &T) -> CliResult<()> {
    let line = serde_json::to_string(value)
        .map_err(|err| CliError::new(t!("output.serialize_failed", error = err)))?;
    write_stdout_line(&line).map_err(|err| CliError::new(stdout_error(&err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized stdout write failure.
fn stdout_error(error: &std::io::Error) -> String {
    t!("output.write_failed", error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
