//! Batch pipeline: drives URLs through lookup, compute, gated
//! analysis, persist, and ordered emission.
//!
//! ### Processing model
//! - Batch-sequential outer loop (progress is reported per batch).
//! - Bounded concurrency inside a batch via Semaphore + JoinSet.
//! - The call budget is the only state shared across workers; its
//!   atomicity keeps total admitted calls at or under the ceiling no
//!   matter the concurrency level.
//!
//! ### Ordering
//! Completions land in any order; they are buffered by input index and
//! the contiguous prefix is emitted as soon as it is complete. Output
//! therefore follows input order while report lines still stream out
//! during the run.
//!
//! ### Cancellation
//! A [`CancelFlag`] stops admission of new items; in-flight items
//! finish or time out, buffered completions are emitted, and stats are
//! finalized normally.

pub mod item;
pub mod stats;

pub use item::{ItemContext, ItemOutcome, ItemReport};
pub use stats::{RunStats, RunSummary};

use pagecheck_client::extract::DEFAULT_MAX_CHARS;
use pagecheck_client::fetch::PageFetcher;
use pagecheck_client::gateway::AnalysisGateway;
use pagecheck_core::{AppConfig, CacheDb, CallBudget, Error, RetryPolicy};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run-level cancellation signal, shared with the signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation: no new items are admitted after this.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Where emitted items go. The report writer is the production sink;
/// tests capture in memory.
pub trait RecordSink: Send {
    /// Receive the next item in input order.
    fn emit(&mut self, report: &ItemReport) -> Result<(), Error>;
}

/// Tuning values for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Items per progress batch.
    pub batch_size: usize,
    /// Cap on items processed in one run.
    pub max_pages: usize,
    /// Concurrent in-flight items within a batch.
    pub max_concurrency: usize,
    /// Cap on extracted text length per page.
    pub max_text_chars: usize,
    /// Shared retry schedule for gateway calls and cache writes.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            max_pages: 200,
            max_concurrency: 4,
            max_text_chars: DEFAULT_MAX_CHARS,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            max_pages: config.max_pages,
            max_concurrency: config.max_concurrency,
            max_text_chars: DEFAULT_MAX_CHARS,
            retry: RetryPolicy::default(),
        }
    }
}

/// The batch orchestrator. Owns nothing shared except handles; every
/// collaborator is injected so tests can run with an in-memory cache,
/// a stub fetcher, and a mock gateway.
pub struct Pipeline {
    config: PipelineConfig,
    db: CacheDb,
    budget: Arc<CallBudget>,
    fetcher: Arc<dyn PageFetcher>,
    gateway: Option<Arc<dyn AnalysisGateway>>,
    cancel: CancelFlag,
}

impl Pipeline {
    /// Assemble a pipeline from its collaborators. A `None` gateway
    /// disables the analysis stage outright.
    pub fn new(
        config: PipelineConfig, db: CacheDb, budget: Arc<CallBudget>, fetcher: Arc<dyn PageFetcher>,
        gateway: Option<Arc<dyn AnalysisGateway>>,
    ) -> Self {
        Self { config, db, budget, fetcher, gateway, cancel: CancelFlag::new() }
    }

    /// Handle for requesting run-level cancellation.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    fn context(&self) -> ItemContext {
        ItemContext {
            db: self.db.clone(),
            budget: Arc::clone(&self.budget),
            fetcher: Arc::clone(&self.fetcher),
            gateway: self.gateway.clone(),
            retry: self.config.retry,
            max_text_chars: self.config.max_text_chars,
        }
    }

    /// Process the URL list, emitting item reports to `sink` in input
    /// order, and return the finalized run statistics.
    pub async fn run(&self, urls: &[String], sink: &mut dyn RecordSink) -> Result<RunSummary, Error> {
        let total = urls.len().min(self.config.max_pages);
        if total < urls.len() {
            tracing::info!("input capped at {} of {} pages", total, urls.len());
        }
        let urls = &urls[..total];

        let mut run_stats = RunStats::new();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let total_batches = total.div_ceil(self.config.batch_size).max(1);

        for (batch_num, batch) in urls.chunks(self.config.batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("cancellation observed; no further batches admitted");
                break;
            }

            let batch_start = batch_num * self.config.batch_size;
            tracing::info!(
                "batch {}/{}: items {}-{} of {}",
                batch_num + 1,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total
            );

            let mut join_set = JoinSet::new();

            for (offset, url) in batch.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    break;
                }

                let permit = Arc::clone(&semaphore)
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Internal(e.to_string()))?;
                let ctx = self.context();
                let url = url.clone();
                let index = batch_start + offset;

                join_set.spawn(async move {
                    let _permit = permit;
                    let outcome = item::process_item(ctx, url.clone()).await;
                    ItemReport { index, url, outcome }
                });
            }

            // Admission is contiguous from batch_start, so emitting the
            // contiguous prefix covers every spawned item.
            let mut pending: BTreeMap<usize, ItemReport> = BTreeMap::new();
            let mut next_emit = batch_start;

            while let Some(joined) = join_set.join_next().await {
                let report = joined.map_err(|e| Error::Internal(format!("worker task failed: {e}")))?;
                pending.insert(report.index, report);

                while let Some(report) = pending.remove(&next_emit) {
                    run_stats.record(&report.outcome);
                    sink.emit(&report)?;
                    next_emit += 1;
                }
            }

            tracing::info!("batch {}/{} complete ({} items so far)", batch_num + 1, total_batches, run_stats.items());
        }

        let cache_entries = match self.db.count_records().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("cache count unavailable: {}", e);
                0
            }
        };

        Ok(run_stats.finalize(&self.budget, cache_entries))
    }
}
