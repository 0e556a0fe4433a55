//! Sitescope command-line interface

use clap::Parser;
use sitescope::config::{load_config, Config};
use sitescope::report;
use sitescope::run::{process_run, request_run, RequestOutcome, RunRequest};
use sitescope::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sitescope: technical SEO site crawler and issue analyzer
///
/// Crawls a target website, extracts structural and content signals from
/// every page, and produces a prioritized list of technical SEO, content
/// and AI-readiness issues.
#[derive(Parser, Debug)]
#[command(name = "sitescope")]
#[command(version)]
#[command(about = "Technical SEO site crawler and issue analyzer", long_about = None)]
struct Cli {
    /// Target URL to crawl and analyze
    #[arg(value_name = "URL", required_unless_present = "report")]
    url: Option<String>,

    /// Maximum number of pages to crawl (1-1000)
    #[arg(long, default_value_t = 100)]
    max_pages: u32,

    /// Ignore robots.txt directives
    #[arg(long)]
    ignore_robots: bool,

    /// Persist external link targets as well
    #[arg(long)]
    include_external: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print results for an existing run id and exit
    #[arg(long, value_name = "RUN_ID", conflicts_with = "url")]
    report: Option<i64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    if let Some(run_id) = cli.report {
        print_results(&storage, run_id)?;
        return Ok(());
    }

    // clap guarantees a URL when --report is absent
    let Some(url) = cli.url else {
        anyhow::bail!("a target URL is required");
    };

    let request = RunRequest {
        url,
        max_pages: cli.max_pages,
        respect_robots: !cli.ignore_robots,
        include_external: cli.include_external,
    };

    let run_id = match request_run(&mut storage, &request)? {
        RequestOutcome::Created(id) => id,
        RequestOutcome::AlreadyActive(id) => {
            println!("An analysis for this domain is already active (run {})", id);
            return Ok(());
        }
    };

    tracing::info!("Starting run {}", run_id);
    process_run(&mut storage, &config, run_id).await?;

    print_results(&storage, run_id)?;
    Ok(())
}

fn print_results(storage: &SqliteStorage, run_id: i64) -> anyhow::Result<()> {
    let summary = report::summary(storage, run_id)?;
    report::print_summary(&summary);

    let issues = report::ranked_issues(storage, run_id)?;
    report::print_issues(&issues, 20);

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitescope=info,warn"),
            1 => EnvFilter::new("sitescope=debug,info"),
            2 => EnvFilter::new("sitescope=trace,debug"),
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
