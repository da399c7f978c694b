//! Hub-Harvester main entry point
//!
//! This is the command-line interface for the Hub-Harvester document harvester.

use anyhow::Context;
use clap::Parser;
use hub_harvester::config::{load_config_with_hash, Config};
use hub_harvester::crawler::HarvestSession;
use hub_harvester::driver::HttpDriver;
use hub_harvester::output::{
    generate_markdown_summary, generate_summary, load_statistics, print_statistics,
};
use hub_harvester::storage::open_storage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Hub-Harvester: an incremental document harvester
///
/// Hub-Harvester walks the infinite-scroll category listings of a content hub,
/// extracts one document per item and stops at the newest document of the
/// previous run, so repeated runs only collect what is new.
#[derive(Parser, Debug)]
#[command(name = "hub-harvester")]
#[command(version = "1.0.0")]
#[command(about = "An incremental document harvester for content hubs", long_about = None)]
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

    /// Ignore the previous run's boundary document and harvest from scratch
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be harvested without harvesting
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_harvest(config, config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hub_harvester=info,warn"),
            1 => EnvFilter::new("hub_harvester=debug,info"),
            2 => EnvFilter::new("hub_harvester=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Hub-Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Source type: {}", config.crawler.source_type);
    println!("  Scroll cap: {}", config.crawler.scroll_cap);
    println!("  Max documents: {}", config.crawler.max_count);
    println!("  Settle interval: {}ms", config.crawler.settle_ms);
    println!("  Element timeout: {}ms", config.crawler.element_timeout_ms);
    println!("  Poll interval: {}ms", config.crawler.poll_interval_ms);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nSelectors:");
    for (name, selector) in config.selectors.entries() {
        println!("  {}: {}", name, selector);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nCategories ({}):", config.categories.len());
    for category in &config.categories {
        println!(
            "  - {} [{}] {}",
            category.label,
            category.effective_source_type(config.crawler.source_type),
            category.url
        );
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest up to {} documents from {} categories",
        config.crawler.max_count,
        config.categories.len()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: writes the markdown summary of the latest run
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Harvest Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = open_storage(Path::new(&config.output.database_path))?;

    tracing::info!("Loading latest run from database...");
    let summary = generate_summary(&storage, None)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, config_hash: String, fresh: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Categories: {}, max documents: {}, scroll cap: {}",
        config.categories.len(),
        config.crawler.max_count,
        config.crawler.scroll_cap
    );

    let mut driver =
        HttpDriver::from_user_agent(&config.user_agent).context("Failed to build HTTP client")?;
    let mut session = HarvestSession::open(config, config_hash, fresh)?;

    let report = session.run(&mut driver).await?;
    let outcome = report.outcome;

    for fault in &outcome.faults {
        tracing::warn!("Abandoned {}", fault);
    }

    if let Some(error) = report.persist_error {
        for doc in &outcome.documents {
            tracing::warn!("Unsaved: {}", doc.log_line());
        }
        return Err(anyhow::Error::new(error).context(format!(
            "Harvest run {} collected {} documents but could not be stored",
            report.run_id,
            outcome.documents.len()
        )));
    }

    if let Some(error) = outcome.fatal {
        tracing::error!(
            "Harvest run {} aborted after {} documents",
            report.run_id,
            outcome.documents.len()
        );
        return Err(error.into());
    }

    tracing::info!(
        "Harvest run {} finished: {} documents ({})",
        report.run_id,
        outcome.documents.len(),
        outcome
            .stop
            .map(|s| s.to_db_string())
            .unwrap_or("aborted")
    );

    Ok(())
}
