//! Cache store handle: open, pragmas, migrations.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Pragmas applied before any use of a connection. WAL keeps readers
/// unblocked during the pipeline's concurrent lookups; NORMAL sync is
/// durable enough for a store that can always be rebuilt.
const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;";

/// Handle to the record store.
///
/// Cloning shares the underlying connection; operations run on a
/// background thread via tokio-rusqlite. Dropping the last clone
/// closes the store cleanly, and SQLite's journaled commits mean a
/// crash mid-write never leaves a readable partial row.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open (or create) the store at `path` and bring its schema up to
    /// date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        tracing::debug!("record cache at {}", path.as_ref().display());
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    /// Open an in-memory store with the same pragmas and schema.
    ///
    /// This is the substitute the pipeline tests run against, so
    /// nothing touches disk.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    async fn configure(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}
