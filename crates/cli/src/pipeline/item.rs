//! Per-item processing: lookup, compute, gated analysis, persist.
//!
//! Each item moves through the stages independently; a failure here
//! marks the one item failed and never aborts the batch. The only
//! shared state an item touches is the call budget.

use chrono::Utc;
use pagecheck_client::gateway::AnalysisGateway;
use pagecheck_client::{canonicalize, check_a11y, check_seo, extract_text, fetch::PageFetcher};
use pagecheck_core::cache::fingerprint;
use pagecheck_core::{CacheDb, CallBudget, PageRecord, RetryPolicy, ToneAnalysis};
use std::sync::Arc;

/// What happened to one item, with its record when one was produced.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    /// Served from the cache; no fetch, no calls.
    CacheHit(PageRecord),
    /// Computed fresh, with a successful analysis call.
    MissWithAnalysis(PageRecord),
    /// Computed fresh; analysis denied, failed, or disabled.
    MissWithoutAnalysis(PageRecord),
    /// The item could not produce a record.
    Failed { error: String },
}

impl ItemOutcome {
    /// The record, when this outcome produced one.
    pub fn record(&self) -> Option<&PageRecord> {
        match self {
            ItemOutcome::CacheHit(record)
            | ItemOutcome::MissWithAnalysis(record)
            | ItemOutcome::MissWithoutAnalysis(record) => Some(record),
            ItemOutcome::Failed { .. } => None,
        }
    }
}

/// One emitted line of the run: the item's input position and outcome.
#[derive(Debug, Clone)]
pub struct ItemReport {
    /// Position in the input list; emission follows this order.
    pub index: usize,
    /// The URL as given in the input.
    pub url: String,
    pub outcome: ItemOutcome,
}

/// Collaborators an item needs, cloned cheaply into each worker.
#[derive(Clone)]
pub struct ItemContext {
    pub db: CacheDb,
    pub budget: Arc<CallBudget>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub gateway: Option<Arc<dyn AnalysisGateway>>,
    pub retry: RetryPolicy,
    pub max_text_chars: usize,
}

/// Drive one URL through lookup, compute, gated analysis, and persist.
pub async fn process_item(ctx: ItemContext, url: String) -> ItemOutcome {
    let canonical = match canonicalize(&url) {
        Ok(parsed) => parsed.to_string(),
        Err(e) => return ItemOutcome::Failed { error: e.to_string() },
    };
    let fingerprint = fingerprint(&canonical);

    // LOOKUP: the fingerprint keys on identity, so this happens before
    // any fetch. A read failure degrades to a miss.
    match ctx.db.get_record(&fingerprint).await {
        Ok(Some(record)) => {
            tracing::debug!("cache hit for {}", canonical);
            return ItemOutcome::CacheHit(record);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("cache lookup failed for {}: {}", canonical, e),
    }

    // COMPUTE: fetch, extract, score. A fetch failure fails the item;
    // an extraction failure degrades to empty-content scoring.
    let html = match ctx.fetcher.fetch_page(&canonical).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("fetch failed for {}: {}", canonical, e);
            return ItemOutcome::Failed { error: e.to_string() };
        }
    };

    let (text, extract_issue) = match extract_text(&html, ctx.max_text_chars) {
        Ok(text) => (text, None),
        Err(e) => {
            tracing::warn!("extraction degraded for {}: {}", canonical, e);
            (String::new(), Some("Failed to extract text content".to_string()))
        }
    };

    let seo = check_seo(&html, &text);
    let a11y = check_a11y(&html, &text);

    // GATE: charged on admission, never refunded. Once the budget is
    // exhausted the gate is skipped entirely but rule output still
    // lands.
    let mut analysis = None;
    if let Some(gateway) = &ctx.gateway
        && !text.is_empty()
        && !ctx.budget.is_exhausted()
        && ctx.budget.try_consume(1)
    {
        analysis = analyze_with_retry(gateway.as_ref(), &text, ctx.retry).await;
    }

    let fetched_at = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let mut record = PageRecord::assemble(canonical, fingerprint, seo, a11y, analysis, fetched_at);
    if let Some(issue) = extract_issue {
        record.issues.insert(0, issue);
    }

    // Persist is best-effort: a record that cannot be cached is still
    // emitted, it just stays ephemeral for this run.
    persist_with_retry(&ctx.db, &record, ctx.retry).await;

    if record.has_analysis() {
        ItemOutcome::MissWithAnalysis(record)
    } else {
        ItemOutcome::MissWithoutAnalysis(record)
    }
}

/// Call the gateway, retrying transient failures under the policy.
///
/// Validation failures and exhausted retries both come back as `None`;
/// the admission charge stands regardless.
async fn analyze_with_retry(gateway: &dyn AnalysisGateway, text: &str, policy: RetryPolicy) -> Option<ToneAnalysis> {
    let mut attempt = 0u32;
    loop {
        match gateway.analyze(text).await {
            Ok(analysis) => return Some(analysis),
            Err(e) if e.is_transient() && policy.should_retry(attempt) => {
                tracing::warn!("transient analysis failure (attempt {}): {}", attempt + 1, e);
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!("analysis call abandoned: {}", e);
                return None;
            }
        }
    }
}

/// Insert the record, retrying under the policy; failure is non-fatal.
async fn persist_with_retry(db: &CacheDb, record: &PageRecord, policy: RetryPolicy) {
    let mut attempt = 0u32;
    loop {
        match db.insert_record(record).await {
            Ok(()) => return,
            Err(e) if policy.should_retry(attempt) => {
                tracing::warn!("cache write failed (attempt {}): {}", attempt + 1, e);
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!("record for {} not cached: {}", record.url, e);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pagecheck_client::GatewayError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedGateway;

    #[async_trait]
    impl AnalysisGateway for FixedGateway {
        async fn analyze(&self, _text: &str) -> Result<ToneAnalysis, GatewayError> {
            Ok(ToneAnalysis { readability: "Clear.".into(), tone: "Neutral.".into(), risks: "None.".into() })
        }
    }

    struct FlakyGateway {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl AnalysisGateway for FlakyGateway {
        async fn analyze(&self, _text: &str) -> Result<ToneAnalysis, GatewayError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(GatewayError::Timeout)
            } else {
                Ok(ToneAnalysis { readability: "Ok.".into(), tone: "Flat.".into(), risks: "None.".into() })
            }
        }
    }

    struct BrokenGateway;

    #[async_trait]
    impl AnalysisGateway for BrokenGateway {
        async fn analyze(&self, _text: &str) -> Result<ToneAnalysis, GatewayError> {
            Err(GatewayError::Parse("not json".into()))
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let gateway = FlakyGateway { calls: AtomicU32::new(0), fail_first: 2 };
        let analysis = analyze_with_retry(&gateway, "text", fast_policy(3)).await;
        assert!(analysis.is_some());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let gateway = FlakyGateway { calls: AtomicU32::new(0), fail_first: 10 };
        let analysis = analyze_with_retry(&gateway, "text", fast_policy(3)).await;
        assert!(analysis.is_none());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_validation_failure_is_not_retried() {
        let gateway = BrokenGateway;
        let analysis = analyze_with_retry(&gateway, "text", fast_policy(5)).await;
        assert!(analysis.is_none());
    }

    #[tokio::test]
    async fn test_fixed_gateway_succeeds_first_try() {
        let analysis = analyze_with_retry(&FixedGateway, "text", fast_policy(1)).await;
        assert!(analysis.is_some());
    }
}
