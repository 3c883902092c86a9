//! Per-page audit record types.
//!
//! A [`PageRecord`] is the unit of output: one per audited URL, written
//! to the report stream and persisted in the cache. Records are
//! immutable once persisted; a later run that shares the fingerprint
//! reads the stored record back verbatim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores, metrics, and issues from one rule category (SEO or a11y).
///
/// Maps are `BTreeMap` so serialization order is deterministic and a
/// warm-cache rerun reproduces the report stream byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleReport {
    /// Mean of the per-rule scores, 0-100.
    pub overall_score: f64,
    /// Per-rule score, 0-100 each.
    pub scores: BTreeMap<String, i64>,
    /// Raw measurements backing the scores (lengths, counts).
    pub metrics: BTreeMap<String, f64>,
    /// Human-readable problems found by this category.
    pub issues: Vec<String>,
}

impl RuleReport {
    /// Recompute `overall_score` as the mean of the per-rule scores.
    pub fn finalize(mut self) -> Self {
        if self.scores.is_empty() {
            self.overall_score = 0.0;
        } else {
            let sum: i64 = self.scores.values().sum();
            self.overall_score = sum as f64 / self.scores.len() as f64;
        }
        self
    }
}

/// Structured result of the external tone-analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneAnalysis {
    /// Brief readability assessment.
    pub readability: String,
    /// Brief tone description.
    pub tone: String,
    /// Potential risks or issues in the content.
    pub risks: String,
}

/// Rule results grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleScores {
    pub seo: RuleReport,
    pub a11y: RuleReport,
}

/// Per-category overall scores, 0-100 each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub seo: f64,
    pub a11y: f64,
}

/// One audited page: the cache value and the per-item report record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// The audited URL.
    pub url: String,
    /// SHA-256 hex digest of the canonicalized URL; the cache key.
    pub fingerprint: String,
    /// Rule check results, one block per category.
    pub rule_scores: RuleScores,
    /// Tone analysis when a budgeted call succeeded, `None` otherwise.
    pub analysis_result: Option<ToneAnalysis>,
    /// Combined issues from all rule categories.
    pub issues: Vec<String>,
    /// Per-category overall scores.
    pub scores: CategoryScores,
    /// ISO8601 timestamp of the fetch that produced this record.
    pub fetched_at: String,
}

impl PageRecord {
    /// Assemble a record from the per-category reports.
    ///
    /// Issues are concatenated in category order (SEO first) so the
    /// combined list is stable across runs.
    pub fn assemble(
        url: String, fingerprint: String, seo: RuleReport, a11y: RuleReport, analysis_result: Option<ToneAnalysis>,
        fetched_at: String,
    ) -> Self {
        let mut issues = seo.issues.clone();
        issues.extend(a11y.issues.iter().cloned());

        let scores = CategoryScores { seo: seo.overall_score, a11y: a11y.overall_score };

        Self {
            url,
            fingerprint,
            rule_scores: RuleScores { seo, a11y },
            analysis_result,
            issues,
            scores,
            fetched_at,
        }
    }

    /// Whether a tone analysis is present.
    pub fn has_analysis(&self) -> bool {
        self.analysis_result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(scores: &[(&str, i64)], issues: &[&str]) -> RuleReport {
        RuleReport {
            scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            issues: issues.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
        .finalize()
    }

    #[test]
    fn test_finalize_mean() {
        let report = report_with(&[("title", 100), ("h1", 50)], &[]);
        assert_eq!(report.overall_score, 75.0);
    }

    #[test]
    fn test_finalize_empty() {
        let report = RuleReport::default().finalize();
        assert_eq!(report.overall_score, 0.0);
    }

    #[test]
    fn test_assemble_concatenates_issues_in_category_order() {
        let seo = report_with(&[("title", 100)], &["Missing meta description"]);
        let a11y = report_with(&[("image_alts", 50)], &["2 images missing alt text"]);

        let record = PageRecord::assemble(
            "https://example.com/".into(),
            "abc".into(),
            seo,
            a11y,
            None,
            "2025-01-01T00:00:00Z".into(),
        );

        assert_eq!(record.issues, vec!["Missing meta description", "2 images missing alt text"]);
        assert_eq!(record.scores.seo, 100.0);
        assert_eq!(record.scores.a11y, 50.0);
        assert!(!record.has_analysis());
    }

    #[test]
    fn test_analysis_serializes_as_null_when_absent() {
        let record = PageRecord::assemble(
            "https://example.com/".into(),
            "abc".into(),
            RuleReport::default(),
            RuleReport::default(),
            None,
            "2025-01-01T00:00:00Z".into(),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["analysis_result"].is_null());
    }

    #[test]
    fn test_record_roundtrip_is_deterministic() {
        let mut metrics = BTreeMap::new();
        metrics.insert("word_count".to_string(), 420.0);
        let seo = RuleReport { metrics, ..report_with(&[("word_count", 75)], &[]) };

        let record = PageRecord::assemble(
            "https://example.com/".into(),
            "abc".into(),
            seo,
            RuleReport::default(),
            Some(ToneAnalysis {
                readability: "Clear".into(),
                tone: "Neutral".into(),
                risks: "None noted".into(),
            }),
            "2025-01-01T00:00:00Z".into(),
        );

        let first = serde_json::to_string(&record).unwrap();
        let reparsed: PageRecord = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string(&reparsed).unwrap();
        assert_eq!(first, second);
    }
}
