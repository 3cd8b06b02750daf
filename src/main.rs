//! # Hacks Scraper
//!
//! Scrapes the article listing of a JavaScript-rendered blog with a headless
//! Chromium and writes the normalized articles to several file formats.
//!
//! ## Features
//!
//! - Drives a real browser so client-side rendered listings are complete
//! - Retries navigation with a linear backoff
//! - Normalizes every record (whitespace, absolute URLs, author cleanup)
//! - Exports JSON, CSV, Excel, plain text and PDF concurrently
//!
//! ## Usage
//!
//! ```sh
//! hacks_scraper -o ./output -f json,csv,pdf
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Configuration**: defaults, optional YAML or preset, CLI overrides, validated once
//! 2. **Extraction**: one browser session; navigate, wait for the list, read the DOM
//! 3. **Normalization**: clean and filter the raw records
//! 4. **Export**: one concurrent task per requested format, joined before reporting

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod models;
mod normalize;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::ScrapeConfig;
use error::ScrapeError;
use models::{ExportOutcome, ExportResult, ExportSummary};
use outputs::{ExportFormat, ExportMeta, ExportTask, export_all};
use scrapers::{ArticleScraper, ChromiumLauncher};
use utils::{ensure_writable_dir, format_file_size};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("hacks_scraper starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.profile, ?args.output_dir, "Parsed CLI arguments");

    if args.list_formats {
        print_formats();
        return Ok(());
    }

    // ---- Configuration ----
    let config = match load_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration rejected");
            print_troubleshooting(&e);
            return Err(e.into());
        }
    };
    let tasks = match ExportTask::plan(&config.output_dir, &config.formats) {
        Ok(tasks) => tasks,
        Err(e) => {
            error!(error = %e, "Export plan rejected");
            print_troubleshooting(&e);
            return Err(e.into());
        }
    };
    info!(
        url = %config.target_url,
        formats = tasks.len(),
        output_dir = %config.output_dir.display(),
        "Configuration loaded"
    );

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Extraction ----
    let output_dir = config.output_dir.clone();
    let mut scraper = ArticleScraper::new(ChromiumLauncher, config)?;
    let source = scraper.target().to_string();
    let articles = match scraper.scrape_articles().await {
        Ok(articles) => articles,
        Err(e) => {
            print_troubleshooting(&e);
            return Err(e.into());
        }
    };
    let article_count = articles.len();

    // ---- Export ----
    let meta = ExportMeta::now(source);
    let results = export_all(Arc::new(articles), &tasks, &meta).await?;
    let summary = ExportSummary::from_results(&results);

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = article_count,
        exported = summary.succeeded,
        failed = summary.failures.len(),
        "Execution complete"
    );

    print_report(article_count, elapsed.as_secs_f64(), &output_dir, &results, &summary);
    Ok(())
}

/// Defaults, then the YAML file or preset, then CLI flags; validated once.
async fn load_config(args: &Cli) -> Result<ScrapeConfig, ScrapeError> {
    let mut config = match (&args.config, args.profile) {
        (Some(path), _) => ScrapeConfig::from_file(path).await?,
        (None, Some(profile)) => profile.preset(),
        (None, None) => ScrapeConfig::default(),
    };
    args.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn print_formats() {
    println!("Supported output formats:");
    for format in ExportFormat::ALL {
        println!(
            "  {:<5} {:<6} {}",
            format.file_extension(),
            format.format_name(),
            format.description()
        );
    }
}

fn print_report(
    article_count: usize,
    elapsed_secs: f64,
    output_dir: &Path,
    results: &[ExportResult],
    summary: &ExportSummary,
) {
    println!();
    println!("Scraping completed");
    println!("  Articles extracted: {article_count}");
    println!("  Elapsed:            {elapsed_secs:.2}s");
    println!("  Output directory:   {}", output_dir.display());
    println!();
    println!("Generated files:");
    for result in results {
        let name = result
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| result.destination.display().to_string());
        match &result.outcome {
            ExportOutcome::Written { bytes } => println!(
                "  [ok]     {name} ({}) - {}",
                format_file_size(*bytes),
                result.format.description()
            ),
            ExportOutcome::Failed { error } => println!("  [failed] {name}: {error}"),
        }
    }
    println!();
    println!(
        "{} of {} files written, {} total",
        summary.succeeded,
        results.len(),
        format_file_size(summary.total_bytes)
    );
}

fn print_troubleshooting(err: &ScrapeError) {
    eprintln!();
    eprintln!("Troubleshooting:");
    match err {
        ScrapeError::InvalidConfig { .. } | ScrapeError::UnsupportedFormat { .. } => {
            eprintln!("  - Check the target URL, retry settings and format names");
            eprintln!("  - Run with --list-formats to see the supported formats");
        }
        ScrapeError::BrowserInit { .. } => {
            eprintln!("  - Make sure Chrome or Chromium is installed and on PATH");
            eprintln!("  - In containers, use --profile production to disable the sandbox");
        }
        ScrapeError::Navigation { .. } => {
            eprintln!("  - Check your internet connection and that the site is reachable");
            eprintln!("  - Raise --retry-attempts or --request-delay-ms");
        }
        ScrapeError::Extraction { .. } | ScrapeError::NoValidArticles => {
            eprintln!("  - The page layout may have changed; the article list was not found");
            eprintln!("  - Run with --profile development to watch the browser");
        }
        ScrapeError::NoExportTasks | ScrapeError::DuplicateDestination { .. } => {
            eprintln!("  - Request at least one format and give each a distinct destination");
        }
    }
    eprintln!("  - Set RUST_LOG=debug for detailed logs");
}
