//! Report output: JSONL record stream and CSV summary.
//!
//! Both files are appended and flushed per item, so an interrupted run
//! leaves valid partial reports. The JSONL stream carries every item
//! (failures as `{url, error}` lines); the CSV summarizes the pages
//! that actually produced scores.

use crate::pipeline::{ItemOutcome, ItemReport, RecordSink};
use pagecheck_core::{Error, PageRecord};
use serde_json::json;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const JSONL_NAME: &str = "pages.jsonl";
const CSV_NAME: &str = "summary.csv";
const CSV_HEADER: &str = "URL,SEO Score,A11y Score,Issues Count,Has Tone Analysis";

/// Streaming writer for the per-run report files.
pub struct ReportWriter {
    jsonl: BufWriter<File>,
    csv: BufWriter<File>,
    jsonl_path: PathBuf,
    csv_path: PathBuf,
    issue_counts: HashMap<String, u64>,
}

impl ReportWriter {
    /// Create the reports directory and both output files.
    pub fn create(dir: &Path) -> Result<Self, Error> {
        std::fs::create_dir_all(dir)?;

        let jsonl_path = dir.join(JSONL_NAME);
        let csv_path = dir.join(CSV_NAME);

        let jsonl = BufWriter::new(File::create(&jsonl_path)?);
        let mut csv = BufWriter::new(File::create(&csv_path)?);
        writeln!(csv, "{CSV_HEADER}")?;

        Ok(Self { jsonl, csv, jsonl_path, csv_path, issue_counts: HashMap::new() })
    }

    /// Path of the JSONL record stream.
    pub fn jsonl_path(&self) -> &Path {
        &self.jsonl_path
    }

    /// Path of the CSV summary.
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// The most frequent issues seen so far, descending, ties by name.
    pub fn top_issues(&self, limit: usize) -> Vec<(String, u64)> {
        let mut issues: Vec<(String, u64)> = self
            .issue_counts
            .iter()
            .map(|(issue, count)| (issue.clone(), *count))
            .collect();
        issues.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        issues.truncate(limit);
        issues
    }

    fn write_record(&mut self, record: &PageRecord) -> Result<(), Error> {
        let line = serde_json::to_string(record).map_err(|e| Error::CorruptRecord(e.to_string()))?;
        writeln!(self.jsonl, "{line}")?;

        writeln!(
            self.csv,
            "{},{:.1},{:.1},{},{}",
            csv_escape(&record.url),
            record.scores.seo,
            record.scores.a11y,
            record.issues.len(),
            if record.has_analysis() { "Yes" } else { "No" }
        )?;

        for issue in &record.issues {
            *self.issue_counts.entry(issue.clone()).or_insert(0) += 1;
        }

        Ok(())
    }

    fn write_failure(&mut self, url: &str, error: &str) -> Result<(), Error> {
        let line = json!({ "url": url, "error": error });
        writeln!(self.jsonl, "{line}")?;
        Ok(())
    }

    /// Flush both streams.
    pub fn finish(&mut self) -> Result<(), Error> {
        self.jsonl.flush()?;
        self.csv.flush()?;
        Ok(())
    }
}

impl RecordSink for ReportWriter {
    fn emit(&mut self, report: &ItemReport) -> Result<(), Error> {
        match &report.outcome {
            ItemOutcome::Failed { error } => self.write_failure(&report.url, error)?,
            ItemOutcome::CacheHit(record)
            | ItemOutcome::MissWithAnalysis(record)
            | ItemOutcome::MissWithoutAnalysis(record) => self.write_record(record)?,
        }

        // Flush per item: a crashed run keeps everything emitted so far.
        self.jsonl.flush()?;
        self.csv.flush()?;
        Ok(())
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
