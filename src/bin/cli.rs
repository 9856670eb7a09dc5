//! Restock monitor CLI
//!
//! Local execution entry point, meant to be run from cron or a scheduled CI job.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use restock::{
    error::Result,
    models::{Config, Credentials},
    pipeline,
    services::{Notifier, SearchClient},
    storage::LocalStateStore,
    utils::{
        clock::{Clock, SystemClock},
        logging,
    },
};

/// restock - Product Restock Monitor
#[derive(Parser, Debug)]
#[command(
    name = "restock",
    version,
    about = "Watches product searches and alerts when items come back in stock"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// State file path (overrides monitor.state_file)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search every keyword once and alert on restocks
    Run,

    /// Validate the configuration file
    Validate,

    /// Show the persisted state summary
    Info,
}

/// Initialize logging based on verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = match (verbose, quiet) {
        (true, _) => "debug",
        (_, true) => "warn",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                logging::format_line(record.level(), &record.args().to_string())
            )
        })
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Run => {
            let credentials = Credentials::from_env().inspect_err(|e| log::error!("{}", e))?;

            let config = Config::load_or_default(&cli.config);
            config
                .validate()
                .inspect_err(|e| log::error!("[config] {}", e))?;
            log::info!(
                "[config] Loaded {} keyword(s) from {}",
                config.keywords.len(),
                cli.config.display()
            );

            let state_path = cli.state.unwrap_or_else(|| config.monitor.state_file.clone());
            let store = LocalStateStore::new(state_path);

            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let mut search =
                SearchClient::from_config(&config.search, credentials.search, Arc::clone(&clock))?;
            let notifier = Notifier::from_config(&config.notify, credentials.notify)?;
            if !notifier.is_enabled() {
                log::warn!("[notify] Push credentials not set, alerts are disabled");
            }

            pipeline::run_monitor(&config, &mut search, &notifier, &store, clock.as_ref()).await?;
        }

        Command::Validate => {
            pipeline::run_validate(&cli.config)?;
            log::info!("All validations passed!");
        }

        Command::Info => {
            let state_path = cli.state.unwrap_or_else(|| {
                Config::load_or_default(&cli.config).monitor.state_file
            });
            pipeline::run_info(&LocalStateStore::new(state_path)).await?;
        }
    }

    Ok(())
}
