//! rentwatch CLI
//!
//! Scheduled-job entry point. `refresh` performs one fetch/reconcile/persist
//! run and exits non-zero on failure, leaving prior state untouched for the
//! scheduler to retry later.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rentwatch::{
    error::Result,
    models::{Config, ListingStatus},
    pipeline::run_refresh,
    storage::{ListingStore, LocalStore, SaveOutcome},
};

/// rentwatch - Alice Springs rental lifecycle tracker
#[derive(Parser, Debug)]
#[command(name = "rentwatch", version, about = "Rental listing lifecycle tracker")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the source page and reconcile the persisted state
    Refresh,

    /// Show a summary of the current persisted state
    Info,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let store = LocalStore::new(&config.storage);

    match cli.command {
        Command::Refresh => {
            match run_refresh(&config, &store).await? {
                SaveOutcome::Written { count } => {
                    log::info!("Refresh complete: {count} listings written")
                }
                SaveOutcome::Unchanged { count } => {
                    log::info!("Refresh complete: {count} listings, no changes")
                }
            }
            Ok(())
        }
        Command::Info => {
            let listings = store.load().await?;
            let available = listings
                .iter()
                .filter(|l| l.status == ListingStatus::Available)
                .count();
            let leased = listings.len() - available;

            println!("Listings: {} ({available} available, {leased} leased)", listings.len());
            match store.load_meta().await? {
                Some(meta) => println!("Last refreshed: {}", meta.generated_at.to_rfc3339()),
                None => println!("Last refreshed: never"),
            }
            Ok(())
        }
        Command::Validate => {
            // load_or_default already fell back silently; surface real errors here.
            let config = Config::load(&cli.config)?;
            config.validate()?;
            println!("Configuration OK");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
