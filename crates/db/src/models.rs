//! Datenbankmodelle fuer clipvault
//!
//! `KeyRecord` ist die persistierte Einheit und zugleich das Element der
//! Backup-Datei. Feldnamen im JSON folgen dem camelCase-Format; die
//! Namen aelterer Browser-Backups (`keyData`, `iv`, `timestamp`) werden
//! beim Einlesen ebenfalls akzeptiert.

use chrono::{DateTime, Utc};
use clipvault_core::VideoId;
use serde::{Deserialize, Serialize};

/// Ein gespeicherter Video-Schluessel
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    pub video_id: VideoId,
    /// Base64 des rohen exportierten Schluessels
    #[serde(alias = "keyData")]
    pub key_bytes: String,
    /// Base64 des IV
    #[serde(alias = "iv")]
    pub iv_bytes: String,
    /// originalName, originalSize, originalType, encryptedSize, ...
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(alias = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
}

impl KeyRecord {
    /// Neuer Datensatz mit aktuellem Zeitstempel (Millisekunden-genau)
    pub fn neu(
        video_id: VideoId,
        key_bytes: String,
        iv_bytes: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            video_id,
            key_bytes,
            iv_bytes,
            metadata,
            stored_at: jetzt_millis(),
        }
    }
}

// Schluesselmaterial nicht ausgeben
impl std::fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRecord")
            .field("video_id", &self.video_id)
            .field("key_bytes", &"[REDACTED]")
            .field("iv_bytes", &self.iv_bytes)
            .field("metadata", &self.metadata)
            .field("stored_at", &self.stored_at)
            .finish()
    }
}

/// Aktuelle Zeit, auf Millisekunden gekuerzt
///
/// Backups speichern Millisekunden; so ueberstehen Datensaetze einen
/// Export/Import-Zyklus unveraendert.
pub(crate) fn jetzt_millis() -> DateTime<Utc> {
    let jetzt = Utc::now();
    DateTime::from_timestamp_millis(jetzt.timestamp_millis()).unwrap_or(jetzt)
}
