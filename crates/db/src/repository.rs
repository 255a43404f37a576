//! Repository-Trait und Datenbank-Konfiguration
//!
//! Das Repository-Pattern entkoppelt die Schluesselverwaltung von der
//! konkreten Datenbank-Implementierung. Der Key-Manager ist generisch ueber
//! [`KeyRepository`], Tests koennen eigene Implementierungen einsetzen.

use clipvault_core::VideoId;
use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::models::KeyRecord;

pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://clipvault-keys.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://clipvault-keys.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Video-Schluessel
#[allow(async_fn_in_trait)]
pub trait KeyRepository: Send + Sync {
    /// Legt einen Datensatz an oder ersetzt den bestehenden (gleiche Video-ID)
    async fn upsert(&self, record: &KeyRecord) -> DbResult<()>;

    /// Laedt den Datensatz einer Video-ID
    async fn get(&self, video_id: &VideoId) -> DbResult<Option<KeyRecord>>;

    /// Entfernt einen Datensatz; `false` wenn keiner existierte
    async fn delete(&self, video_id: &VideoId) -> DbResult<bool>;

    /// Alle gespeicherten Video-IDs, sortiert nach Speicherzeitpunkt
    async fn list_ids(&self) -> DbResult<Vec<VideoId>>;

    /// Alle Datensaetze, sortiert nach Speicherzeitpunkt
    async fn list_all(&self) -> DbResult<Vec<KeyRecord>>;

    /// Schreibt mehrere Datensaetze in einer Transaktion
    ///
    /// Entweder werden alle uebernommen oder keiner.
    async fn upsert_many(&self, records: &[KeyRecord]) -> DbResult<usize>;

    /// Loescht alle Datensaetze, gibt die Anzahl zurueck
    async fn clear(&self) -> DbResult<u64>;

    /// Anzahl gespeicherter Datensaetze
    async fn count(&self) -> DbResult<u64>;
}
