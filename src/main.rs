//! Mirror-Crawl main entry point
//!
//! This is the command-line interface for the Mirror-Crawl site mirrorer.

use anyhow::{bail, Context};
use clap::Parser;
use mirror_crawl::config::{load_config, parse_cookies, validate, Config};
use mirror_crawl::crawl;
use mirror_crawl::crawler::InterruptPrompt;
use mirror_crawl::output::print_report;
use mirror_crawl::TerminationReason;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Mirror-Crawl: recursively mirror the files of a website
///
/// Mirror-Crawl starts at a root page, follows the links found inside an
/// optional container element, and downloads every non-page resource into
/// a directory tree named after the host and path.
#[derive(Parser, Debug)]
#[command(name = "mirror-crawl")]
#[command(version)]
#[command(about = "Recursively mirror the files of a website", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (flags override its values)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Root address to start crawling from
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// Directory to mirror into
    #[arg(short = 'p', long = "download-path")]
    download_path: Option<PathBuf>,

    /// Cookies as a JSON object, e.g. '{"session": "abc"}'
    #[arg(short = 'c', long)]
    cookies: Option<String>,

    /// Only extract links inside the element with this id
    #[arg(long = "id")]
    container_id: Option<String>,

    /// Re-download files that already exist
    #[arg(short = 'o', long)]
    overwrite: bool,

    /// Resume from the progress file
    #[arg(short = 'r', long)]
    resume: bool,

    /// Save progress every N completed addresses (0 = never)
    #[arg(short = 'b', long = "backup-interval")]
    backup_interval: Option<u64>,

    /// Progress file name, relative to the download path
    #[arg(short = 'f', long = "progress-file")]
    progress_file: Option<PathBuf>,

    /// Do not remember completed addresses (may fetch pages repeatedly)
    #[arg(short = 'l', long = "dont-prevent-loops")]
    dont_prevent_loops: bool,

    /// Only follow links found on the root page
    #[arg(short = 'n', long = "no-recursion")]
    no_recursion: bool,

    /// Number of concurrent requests per round
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Give up on an address after this many consecutive failures (0 = never)
    #[arg(long = "max-retries")]
    max_retries: Option<u32>,

    /// Answer yes to the whole-page confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Validate the configuration and print it without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Asks on stdin whether to save progress after Ctrl+C
struct StdinPrompt;

impl InterruptPrompt for StdinPrompt {
    fn confirm_save(&mut self) -> bool {
        ask_yes_no("Save progress? [Y/n] ")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        print_config(&config);
        return Ok(());
    }

    if config.crawl.container_id.is_none()
        && !cli.yes
        && !ask_yes_no("No container id given, scan the whole page? [Y/n] ")
    {
        bail!("Aborted: pass --id to restrict link extraction, or --yes to scan whole pages");
    }

    let report = crawl(config, &mut StdinPrompt).await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    if !cli.quiet {
        print_report(&report);
    }
    if report.reason == TerminationReason::InterruptedAndSaved {
        tracing::info!("Run again with --resume to continue");
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mirror_crawl=info,warn"),
            1 => EnvFilter::new("mirror_crawl=debug,info"),
            2 => EnvFilter::new("mirror_crawl=trace,debug"),
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

/// Loads the optional config file and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match (&cli.config, &cli.url) {
        (Some(path), _) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        (None, Some(url)) => Config::for_root(url.as_str()),
        (None, None) => bail!("Either a config file or --url is required"),
    };

    if let Some(url) = &cli.url {
        config.crawl.root_url = url.clone();
    }
    if let Some(path) = &cli.download_path {
        config.output.download_path = path.clone();
    }
    if let Some(json) = &cli.cookies {
        let cookies = parse_cookies(json).context("Invalid --cookies value")?;
        config.http.cookies.extend(cookies);
    }
    if let Some(id) = &cli.container_id {
        config.crawl.container_id = Some(id.clone()).filter(|id| !id.is_empty());
    }
    if let Some(interval) = cli.backup_interval {
        config.checkpoint.backup_interval = interval;
    }
    if let Some(file) = &cli.progress_file {
        config.checkpoint.file = file.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawl.concurrency = concurrency;
    }
    if let Some(max_retries) = cli.max_retries {
        config.crawl.max_retries = max_retries;
    }

    config.output.overwrite |= cli.overwrite;
    config.checkpoint.resume |= cli.resume;
    config.crawl.no_recursion |= cli.no_recursion;
    if cli.dont_prevent_loops {
        config.crawl.prevent_loops = false;
    }

    Ok(config)
}

/// Prints a yes/no question and reads the answer; an empty answer is yes
fn ask_yes_no(question: &str) -> bool {
    print!("{}", question);
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

/// Handles the --dry-run mode: shows what would be crawled
fn print_config(config: &Config) {
    println!("=== Mirror-Crawl Dry Run ===\n");

    println!("Crawl:");
    println!("  Root: {}", config.crawl.root_url);
    println!(
        "  Container id: {}",
        config.crawl.container_id.as_deref().unwrap_or("(whole page)")
    );
    println!("  Concurrency: {}", config.crawl.concurrency);
    println!("  Prevent loops: {}", config.crawl.prevent_loops);
    println!("  No recursion: {}", config.crawl.no_recursion);
    match config.crawl.max_retries {
        0 => println!("  Max retries: unlimited"),
        n => println!("  Max retries: {}", n),
    }

    println!("\nOutput:");
    println!("  Download path: {}", config.output.download_path.display());
    println!("  Overwrite: {}", config.output.overwrite);

    println!("\nCheckpoint:");
    println!("  File: {}", config.checkpoint_path().display());
    println!("  Resume: {}", config.checkpoint.resume);
    match config.checkpoint.backup_interval {
        0 => println!("  Backup interval: disabled"),
        n => println!("  Backup interval: every {} completions", n),
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Cookies: {}", config.http.cookies.len());

    println!("\n✓ Configuration is valid");
}
