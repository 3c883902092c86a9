//! Cache schema migrations.
//!
//! A version table records the highest migration applied; on open,
//! every newer migration runs inside a single connection call.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Ordered migration list: (version, SQL batch).
///
/// Versions are incrementing integers tracked in the `schema_version`
/// table. Each batch is idempotent via CREATE IF NOT EXISTS so a
/// half-applied open can safely re-run.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_records.sql"))];

/// Apply any migrations newer than the stored schema version.
///
/// # Errors
///
/// Returns [`Error::MigrationFailed`] when a migration batch fails to
/// execute.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let applied: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
            row.get(0)
        })?;

        for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > applied) {
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let has_records: bool = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='records')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();

        assert!(has_records);
    }

    #[tokio::test]
    async fn test_migrations_version_tracking() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let applied: i64 = conn
            .call(|conn| conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0)))
            .await
            .unwrap();

        assert_eq!(applied, MIGRATIONS.last().unwrap().0);
    }
}
