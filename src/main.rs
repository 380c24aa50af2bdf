//! SiteVision Mirror main entry point
//!
//! This is the command-line interface for the resumable content tree mirror.

use anyhow::{Context, Result};
use clap::Parser;
use sitevision_mirror::config::{load_config_with_hash, Config};
use sitevision_mirror::crawler::{run_mirror, CrawlOutcome};
use sitevision_mirror::storage::{inspect_storage, open_storage, StorageError};
use sitevision_mirror::SyncError;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// SiteVision Mirror: a resumable content tree mirror
///
/// Walks a remote content tree depth first, stores every page with its
/// actors and child edges in SQLite, and checkpoints after every node so an
/// interrupted run resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "sitevision-mirror")]
#[command(version)]
#[command(about = "A resumable content tree mirror", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard the saved traversal position and start from the root listing
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "tree"])]
    fresh: bool,

    /// Validate config and database without mirroring anything
    #[arg(long, conflicts_with_all = ["stats", "tree"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "tree"])]
    stats: bool,

    /// Print the mirrored tree from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    tree: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.tree {
        handle_tree(&config)
    } else {
        handle_mirror(&config, &config_hash, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitevision_mirror=info,warn"),
            1 => EnvFilter::new("sitevision_mirror=debug,info"),
            2 => EnvFilter::new("sitevision_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn database_path(config: &Config) -> &Path {
    Path::new(&config.database.path)
}

/// Handles the --dry-run mode: validates config and checks the database
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("=== SiteVision Mirror Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Root URI: {}", config.api.root_uri);
    println!(
        "  Auth: {}",
        config.api.username.as_deref().unwrap_or("none")
    );
    println!("  Timeout: {}s", config.api.timeout_secs);

    println!("\nCrawler:");
    println!("  Skip names: {}", config.crawler.skip_names.join(", "));
    println!(
        "  Properties retries: {} attempts, {}ms to {}ms backoff",
        config.crawler.properties_max_attempts,
        config.crawler.properties_backoff_ms,
        config.crawler.properties_backoff_max_ms
    );

    println!("\nState:");
    println!("  Checkpoint: {}", config.checkpoint.path);
    println!("  Database: {}", config.database.path);

    println!("\n✓ Configuration is valid");

    match inspect_storage(database_path(config)) {
        Ok(_) => println!("✓ Database schema is complete"),
        Err(SyncError::Storage(
            e @ (StorageError::MissingDatabase(_)
            | StorageError::NoTables
            | StorageError::MissingTable(_)),
        )) if config.database.create_schema => {
            println!("! {}, the first run will create it", e);
        }
        Err(e) => return Err(e).context("Database check failed"),
    }

    let resume = Path::new(&config.checkpoint.path).exists();
    println!(
        "✓ Would {} below {}",
        if resume {
            "resume from the checkpoint"
        } else {
            "start from the root listing"
        },
        config.api.root_uri
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    use sitevision_mirror::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.database.path);

    let storage = open_storage(database_path(config), false)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --tree mode: prints the stored tree
fn handle_tree(config: &Config) -> Result<()> {
    use sitevision_mirror::output::print_tree;

    let storage = open_storage(database_path(config), false)?;
    print_tree(&storage)?;

    Ok(())
}

/// Handles the main mirror operation
async fn handle_mirror(config: &Config, config_hash: &str, fresh: bool) -> Result<()> {
    if fresh {
        tracing::info!("Starting fresh mirror (ignoring saved position)");
    } else {
        tracing::info!("Starting mirror (will resume from checkpoint if present)");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, stopping after the current node");
            let _ = shutdown_tx.send(true);
        }
    });

    match run_mirror(config, config_hash, fresh, shutdown_rx).await {
        Ok(report) => {
            match report.outcome {
                CrawlOutcome::Completed => println!("Mirror completed"),
                CrawlOutcome::Interrupted => println!("Mirror interrupted, run again to resume"),
            }
            println!("  {}", report.stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Mirror failed: {}", e);
            Err(e.into())
        }
    }
}
