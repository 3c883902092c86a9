//! pagecheck entry point.
//!
//! Wires the configuration, cache, fetch client, and analysis gateway
//! into the batch pipeline. Logging goes to stderr so the summary on
//! stdout stays clean.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pagecheck_client::fetch::PageFetcher;
use pagecheck_client::gateway::AnalysisGateway;
use pagecheck_client::{FetchClient, FetchConfig, ToneClient, ToneConfig};
use pagecheck_core::{AppConfig, CacheDb, CallBudget};

mod input;
mod pipeline;
mod report;

use pipeline::{Pipeline, PipelineConfig, RunSummary};
use report::ReportWriter;

#[derive(Parser)]
#[command(name = "pagecheck", version, about = "Content audit for SEO, accessibility, and tone")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a content audit over a list of URLs.
    Audit(AuditArgs),
}

#[derive(Args)]
struct AuditArgs {
    /// Path to a CSV file with URLs.
    #[arg(short, long)]
    input: PathBuf,

    /// Maximum pages to process.
    #[arg(long)]
    max_pages: Option<usize>,

    /// Pages per batch.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Concurrent in-flight pages within a batch.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Disable tone analysis.
    #[arg(long)]
    no_analysis: bool,

    /// Maximum tone-analysis calls for this run.
    #[arg(long)]
    max_calls: Option<u32>,

    /// Cache database path.
    #[arg(long)]
    cache_db: Option<PathBuf>,

    /// Reports directory.
    #[arg(long)]
    reports_dir: Option<PathBuf>,

    /// Clear the cache before the run.
    #[arg(long)]
    clear_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Audit(args) => audit(args).await,
    }
}

async fn audit(args: AuditArgs) -> Result<()> {
    let mut config = AppConfig::load()?;
    apply_overrides(&mut config, &args);

    // The one fatal condition: bad configuration aborts here, before
    // any item is touched.
    config.validate()?;

    let db = CacheDb::open(&config.db_path).await?;
    if args.clear_cache {
        let removed = db.clear().await?;
        tracing::info!("cache cleared ({} entries)", removed);
    }

    let urls = input::load_urls(&args.input)?;
    anyhow::ensure!(!urls.is_empty(), "no URLs found in {}", args.input.display());

    let budget = Arc::new(CallBudget::new(if config.analysis.enabled {
        config.analysis.max_calls
    } else {
        0
    }));

    let fetch_config = FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    };
    let fetcher: Arc<dyn PageFetcher> = Arc::new(FetchClient::new(fetch_config)?);

    let gateway: Option<Arc<dyn AnalysisGateway>> = if config.analysis.enabled {
        Some(Arc::new(ToneClient::new(ToneConfig::from(&config.analysis))?))
    } else {
        None
    };

    let mut writer = ReportWriter::create(&config.reports_dir)?;
    let pipeline = Pipeline::new(PipelineConfig::from(&config), db, budget, fetcher, gateway);

    let cancel = pipeline.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; letting in-flight items finish");
            cancel.cancel();
        }
    });

    tracing::info!(
        "auditing {} pages (analysis {})",
        urls.len().min(config.max_pages),
        if config.analysis.enabled { "enabled" } else { "disabled" }
    );

    let summary = pipeline.run(&urls, &mut writer).await?;
    writer.finish()?;

    tracing::debug!("run summary: {}", serde_json::to_string(&summary).unwrap_or_default());
    print_summary(&summary, &writer, config.analysis.enabled);

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &AuditArgs) {
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if args.no_analysis {
        config.analysis.enabled = false;
    }
    if let Some(max_calls) = args.max_calls {
        config.analysis.max_calls = max_calls;
    }
    if let Some(cache_db) = &args.cache_db {
        config.db_path = cache_db.clone();
    }
    if let Some(reports_dir) = &args.reports_dir {
        config.reports_dir = reports_dir.clone();
    }
}

fn print_summary(summary: &RunSummary, writer: &ReportWriter, analysis_enabled: bool) {
    println!();
    println!("Run statistics:");
    println!("  pages processed     {}", summary.items_processed);
    println!("  cache hits          {}", summary.cache_hits);
    println!("  failed              {}", summary.failed);
    println!("  elapsed             {:.1}s", summary.elapsed_ms as f64 / 1000.0);
    println!("  avg time per page   {:.2}s", summary.avg_ms_per_item / 1000.0);
    println!("  cache entries       {}", summary.cache_entries);
    if analysis_enabled {
        println!(
            "  analysis calls      {} consumed, {} remaining",
            summary.calls_consumed, summary.calls_remaining
        );
    }

    let top = writer.top_issues(10);
    if !top.is_empty() {
        println!();
        println!("Top issues:");
        for (issue, count) in top {
            println!("  {issue} ({count} pages)");
        }
    }

    println!();
    println!(
        "Reports: {} and {}",
        writer.jsonl_path().display(),
        writer.csv_path().display()
    );
}
