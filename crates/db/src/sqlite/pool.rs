//! Geraetelokaler Schluesselspeicher auf SQLite
//!
//! Eine Datei pro Geraet. Mehrere clipvault-Aufrufe koennen gleichzeitig
//! auf dieselbe Datei zugreifen (z.B. `upload` und `keys export`), daher
//! WAL und ein Busy-Timeout statt sofortigem `SQLITE_BUSY`.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::repository::{DatabaseConfig, DbResult};

/// Wartezeit auf eine Schreibsperre eines anderen Prozesses
const SPERR_TIMEOUT: Duration = Duration::from_secs(5);

/// Verbindungspool auf die Schluesseldatenbank
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet den Schluesselspeicher, legt ihn beim ersten Start an
    /// und bringt das Schema auf den aktuellen Stand
    pub async fn oeffnen(config: &DatabaseConfig) -> DbResult<Self> {
        let mut opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .busy_timeout(SPERR_TIMEOUT);
        opts = if config.sqlite_wal {
            // Nach einem Absturz geht hoechstens der letzte Commit verloren,
            // die Datei bleibt konsistent
            opts.journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        } else {
            opts.journal_mode(SqliteJournalMode::Delete)
                .synchronous(SqliteSynchronous::Full)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen.max(1))
            .connect_with(opts)
            .await?;

        info!(url = %config.url, wal = config.sqlite_wal, "Schluesseldatenbank geoeffnet");

        let db = Self { pool };
        db.schema_aktualisieren().await?;
        Ok(db)
    }

    async fn schema_aktualisieren(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Schliesst alle Verbindungen; ausstehende WAL-Seiten werden geschrieben
    pub async fn schliessen(&self) {
        self.pool.close().await;
        info!("Schluesseldatenbank geschlossen");
    }

    /// Fluechtiger Schluesselspeicher fuer Tests
    pub async fn in_memory() -> DbResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Jede Verbindung haette sonst ihre eigene leere Datenbank
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect_with(opts)
            .await?;

        let db = Self { pool };
        db.schema_aktualisieren().await?;
        Ok(db)
    }
}
