//! fantree - recursive async file-tree operations.
//!
//! Usage:
//!   fantree delete PATH          Recursively delete a directory
//!   fantree deltree PATH         Rename a directory away, then delete it
//!   fantree mkdir PATH           Create a directory and its missing parents
//!   fantree copy SRC DST         Copy a file or directory tree
//!   fantree --help               Show help

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tracing_subscriber::EnvFilter;

use fantree_core::EngineConfig;
use fantree_ops::{OperationComplete, OperationEvent, OperationExecutor, TreeOperation};

#[derive(Parser)]
#[command(
    name = "fantree",
    version,
    about = "Recursive async file-tree operations",
    long_about = "fantree deletes, copies and creates directory trees with concurrent I/O,\n\
                  reporting once when the whole tree has been processed."
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Maximum primitive I/O requests in flight (0 = unlimited; overrides --config)
    #[arg(long, global = true)]
    max_ops: Option<usize>,

    /// Load engine settings from a JSON file (flags override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recursively delete a directory in place
    Delete {
        /// Directory to delete
        path: PathBuf,
    },

    /// Rename a directory away atomically, then delete it
    Deltree {
        /// Directory to delete
        path: PathBuf,

        /// Exit right after the rename; a cleanup cut short is finished by
        /// the next deltree of the same path
        #[arg(short, long)]
        detach: bool,

        /// Suffix for the temporary name
        #[arg(long)]
        suffix: Option<String>,
    },

    /// Create a directory and any missing parents
    Mkdir {
        /// Directory to create
        path: PathBuf,
    },

    /// Copy a file or directory tree
    Copy {
        /// Source file or directory
        source: PathBuf,

        /// Destination path
        destination: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let operation = match cli.command {
        Command::Delete { path } => TreeOperation::delete(path),
        Command::Deltree { path, detach, .. } => TreeOperation::deltree(path, !detach),
        Command::Mkdir { path } => TreeOperation::make_dirs(path),
        Command::Copy {
            source,
            destination,
        } => TreeOperation::copy(source, destination),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let complete = runtime.block_on(run_operation(config, operation))?;

    match cli.format {
        OutputFormat::Text => print_summary(&complete),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&complete)?),
    }

    match complete.error {
        Some(error) => Err(eyre!(error)),
        None => Ok(()),
    }
}

/// Configure the tracing subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build the engine config from an optional JSON file plus CLI flags.
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            EngineConfig::from_json(&json).map_err(|e| eyre!("Invalid config: {e}"))?
        }
        None => EngineConfig::default(),
    };

    if let Some(max_ops) = cli.max_ops {
        config.max_concurrent_ops = max_ops;
    }
    if let Command::Deltree {
        suffix: Some(suffix),
        ..
    } = &cli.command
    {
        config = EngineConfig::builder()
            .name(config.name)
            .max_concurrent_ops(config.max_concurrent_ops)
            .deltree_suffix(suffix.clone())
            .build()
            .map_err(|e| eyre!("Invalid suffix: {e}"))?;
    }

    Ok(config)
}

/// Run one operation through the executor and wait for its completion event.
async fn run_operation(
    config: EngineConfig,
    operation: TreeOperation,
) -> Result<OperationComplete> {
    let executor = OperationExecutor::with_config(config);
    let mut rx = executor.execute(operation);

    while let Some(event) = rx.recv().await {
        match event {
            OperationEvent::Started(op) => tracing::info!(?op, "started"),
            OperationEvent::Complete(complete) => return Ok(complete),
        }
    }

    Err(eyre!("Operation ended without reporting completion"))
}

fn print_summary(complete: &OperationComplete) {
    println!("{}", complete.summary());
    if complete.report.bytes > 0 {
        println!(" {}", format_size(complete.report.bytes));
    }
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
