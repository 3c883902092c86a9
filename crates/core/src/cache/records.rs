//! Record storage operations.
//!
//! A record is written exactly once per fingerprint and read back
//! verbatim on every later run that shares the fingerprint. The only
//! destruction path is the explicit wholesale [`CacheDb::clear`]; there
//! is no TTL or eviction.

use super::connection::CacheDb;
use crate::record::{CategoryScores, PageRecord, RuleScores};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Persist a record, keeping any existing row for the fingerprint.
    ///
    /// The insert is a single transactional statement: it either lands
    /// whole or not at all. `ON CONFLICT DO NOTHING` gives the
    /// write-once guarantee; re-inserting an existing fingerprint is a
    /// no-op.
    pub async fn insert_record(&self, record: &PageRecord) -> Result<(), Error> {
        let seo_json = serde_json::to_string(&record.rule_scores.seo).map_err(|e| Error::CorruptRecord(e.to_string()))?;
        let a11y_json =
            serde_json::to_string(&record.rule_scores.a11y).map_err(|e| Error::CorruptRecord(e.to_string()))?;
        let analysis_json = match &record.analysis_result {
            Some(analysis) => Some(serde_json::to_string(analysis).map_err(|e| Error::CorruptRecord(e.to_string()))?),
            None => None,
        };
        let issues_json = serde_json::to_string(&record.issues).map_err(|e| Error::CorruptRecord(e.to_string()))?;

        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO records (
                        fingerprint, url, fetched_at,
                        seo_json, a11y_json, analysis_json, issues_json,
                        seo_score, a11y_score
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(fingerprint) DO NOTHING",
                    params![
                        &record.fingerprint,
                        &record.url,
                        &record.fetched_at,
                        &seo_json,
                        &a11y_json,
                        &analysis_json,
                        &issues_json,
                        record.scores.seo,
                        record.scores.a11y,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a record by fingerprint.
    ///
    /// Returns None on a miss; reads never mutate the store.
    pub async fn get_record(&self, fingerprint: &str) -> Result<Option<PageRecord>, Error> {
        let fingerprint = fingerprint.to_string();
        let row = self
            .conn
            .call(
                move |conn| -> Result<Option<(String, String, String, String, String, Option<String>, String)>, Error> {
                    let mut stmt = conn.prepare(
                        "SELECT fingerprint, url, fetched_at, seo_json, a11y_json, analysis_json, issues_json
                         FROM records WHERE fingerprint = ?1",
                    )?;

                    let result = stmt.query_row(params![fingerprint], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                        ))
                    });

                    match result {
                        Ok(columns) => Ok(Some(columns)),
                        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                        Err(e) => Err(e.into()),
                    }
                },
            )
            .await
            .map_err(Error::from)?;

        let Some((fingerprint, url, fetched_at, seo_json, a11y_json, analysis_json, issues_json)) = row else {
            return Ok(None);
        };

        let seo = serde_json::from_str(&seo_json).map_err(|e| Error::CorruptRecord(e.to_string()))?;
        let a11y = serde_json::from_str(&a11y_json).map_err(|e| Error::CorruptRecord(e.to_string()))?;
        let analysis_result = match analysis_json {
            Some(json) => Some(serde_json::from_str(&json).map_err(|e| Error::CorruptRecord(e.to_string()))?),
            None => None,
        };
        let issues = serde_json::from_str(&issues_json).map_err(|e| Error::CorruptRecord(e.to_string()))?;

        let rule_scores = RuleScores { seo, a11y };
        let scores = CategoryScores {
            seo: rule_scores.seo.overall_score,
            a11y: rule_scores.a11y.overall_score,
        };

        Ok(Some(PageRecord {
            url,
            fingerprint,
            rule_scores,
            analysis_result,
            issues,
            scores,
            fetched_at,
        }))
    }

    /// Wipe all records unconditionally.
    ///
    /// Returns the number of entries removed.
    pub async fn clear(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM records", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of records currently stored, for the statistics surface.
    pub async fn count_records(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
