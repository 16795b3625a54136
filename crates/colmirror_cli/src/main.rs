//! colmirror CLI
//!
//! Command-line host for the colmirror sync engine.
//!
//! # Commands
//!
//! - `sync` - Sync an account against a fixture-described remote
//! - `watch` - Trigger syncs on a timer
//! - `inspect` - Display the cache of an account

mod commands;
mod fixture;
mod remote;
mod store;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// colmirror command-line sync tools.
#[derive(Parser)]
#[command(name = "colmirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding one cache file per account
    #[arg(global = true, short, long, default_value = ".colmirror")]
    state_dir: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the commands that sync.
#[derive(Args)]
struct SyncArgs {
    /// JSON fixture describing the remote state
    #[arg(short, long)]
    fixture: PathBuf,

    /// Account to sync
    #[arg(short, long)]
    account: String,

    /// Collections or items requested per page
    #[arg(long)]
    page_size: Option<u32>,

    /// JSON file with sync settings
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync an account once
    Sync {
        #[command(flatten)]
        args: SyncArgs,

        /// Return every error instead of swallowing recoverable ones
        #[arg(long)]
        strict: bool,
    },

    /// Trigger syncs on a timer
    Watch {
        #[command(flatten)]
        args: SyncArgs,

        /// Seconds between triggers
        #[arg(short, long, default_value = "5")]
        interval_secs: u64,

        /// Number of triggers
        #[arg(short, long, default_value = "3")]
        ticks: u32,
    },

    /// Display the cache of an account
    Inspect {
        /// Account to inspect
        #[arg(short, long)]
        account: String,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Sync { args, strict } => {
            let config = commands::load_config(args.config.as_deref(), args.page_size).await?;
            commands::sync::run(&cli.state_dir, &args.fixture, &args.account, strict, config)
                .await?;
        }
        Commands::Watch {
            args,
            interval_secs,
            ticks,
        } => {
            let config = commands::load_config(args.config.as_deref(), args.page_size).await?;
            commands::watch::run(
                &cli.state_dir,
                &args.fixture,
                &args.account,
                Duration::from_secs(interval_secs),
                ticks,
                config,
            )
            .await?;
        }
        Commands::Inspect { account, format } => {
            commands::inspect::run(&cli.state_dir, &account, &format).await?;
        }
        Commands::Version => {
            println!("colmirror CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
