//! LedgerKV CLI
//!
//! Command-line interface for a LedgerKV log file.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ledgerkv::{Config, LedgerError, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// LedgerKV CLI
#[derive(Parser, Debug)]
#[command(name = "ledgerkv-cli")]
#[command(about = "Embeddable append-only key-value store")]
#[command(version)]
struct Args {
    /// Log file
    #[arg(short, long, default_value = "./ledgerkv.log")]
    log: String,

    /// Serve reads by scanning the log instead of an in-memory index
    #[arg(long)]
    no_memory_index: bool,

    /// Maximum distinct keys (memory index only)
    #[arg(long, default_value = "10000")]
    max_entries: usize,

    /// Maximum key size in bytes
    #[arg(long, default_value = "256")]
    max_key_bytes: usize,

    /// Maximum value size in bytes
    #[arg(long, default_value = "4096")]
    max_value_bytes: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List entries whose key or value equals the given ones
    Find {
        /// Match this key
        #[arg(short, long)]
        key: Option<String>,

        /// Match this value
        #[arg(short, long)]
        value: Option<String>,
    },

    /// Rewrite the log to its live entries
    Compact,

    /// Show store statistics
    Stats,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ledgerkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(LedgerError::NotFound) => {
            println!("no matching entries");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> ledgerkv::Result<()> {
    let config = Config::builder()
        .use_memory_index(!args.no_memory_index)
        .max_entries(args.max_entries)
        .max_key_bytes(args.max_key_bytes)
        .max_value_bytes(args.max_value_bytes)
        .build();

    let store = Store::open(&args.log, config)?;

    match args.command {
        Commands::Get { key } => match store.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Set { key, value } => {
            store.set(&key, &value)?;
            println!("OK");
        }
        Commands::Del { key } => {
            store.delete(&key)?;
            println!("OK");
        }
        Commands::Find { key, value } => {
            let mut entries = store.find_by(|k, v| {
                key.as_deref() == Some(k) || value.as_deref() == Some(v)
            })?;
            entries.sort();
            for entry in entries {
                println!("{}\t{}", entry.key, entry.value);
            }
        }
        Commands::Compact => {
            let stats = store.compact()?;
            println!(
                "compacted {} -> {} bytes ({} records)",
                stats.bytes_before, stats.bytes_after, stats.records_written
            );
        }
        Commands::Stats => {
            let stats = store.stats()?;
            println!("live keys:    {}", stats.live_keys);
            println!("log bytes:    {}", stats.log_bytes);
            println!("memory index: {}", stats.memory_index);
        }
    }

    store.close()
}
