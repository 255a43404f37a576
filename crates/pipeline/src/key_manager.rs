//! KeyManager – lokale Verwaltung der Video-Schluessel
//!
//! Ein Schluessel existiert ausschliesslich auf diesem Geraet. Geht er
//! verloren, ist das zugehoerige Video nicht wiederherstellbar; der
//! Server hat keine Kopie.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clipvault_core::VideoId;
use clipvault_crypto::encoding::{base64_zu_bytes, bytes_zu_base64};
use clipvault_crypto::{export_key, import_key, Iv, VideoKey};
use clipvault_db::{KeyBackup, KeyRecord, KeyRepository};

use crate::error::{VaultError, VaultResult};

/// Ein geladener Schluessel mit IV und Metadaten
#[derive(Debug, Clone)]
pub struct GespeicherterSchluessel {
    pub key: VideoKey,
    pub iv: Iv,
    pub metadata: serde_json::Value,
    pub gespeichert_am: DateTime<Utc>,
}

/// Ausdrueckliche Bestaetigung fuer `clear_all_keys`
#[derive(Debug, Clone, Copy)]
pub struct LoeschBestaetigung(());

impl LoeschBestaetigung {
    /// Bestaetigung aus einem Benutzer-Flag (z.B. `--ja`)
    pub fn aus_flag(bestaetigt: bool) -> VaultResult<Self> {
        if bestaetigt {
            Ok(Self(()))
        } else {
            Err(VaultError::BestaetigungFehlt)
        }
    }
}

/// Schluesselverwaltung ueber einem beliebigen [`KeyRepository`]
pub struct KeyManager<R: KeyRepository> {
    repo: Arc<R>,
}

impl<R: KeyRepository> Clone for KeyManager<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: KeyRepository> KeyManager<R> {
    pub fn neu(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Speichert Schluessel, IV und Metadaten (ersetzt einen bestehenden Eintrag)
    pub async fn store_key(
        &self,
        video_id: &VideoId,
        key: &VideoKey,
        iv: &Iv,
        metadata: &serde_json::Value,
    ) -> VaultResult<()> {
        if !video_id.ist_gueltig() {
            return Err(VaultError::format("Video-ID darf nicht leer sein"));
        }

        let record = KeyRecord::neu(
            video_id.clone(),
            bytes_zu_base64(&export_key(key)),
            bytes_zu_base64(iv.as_bytes()),
            metadata.clone(),
        );
        self.repo.upsert(&record).await?;

        tracing::info!(video_id = %video_id, "Schluessel gespeichert");
        Ok(())
    }

    /// Laedt den Schluessel einer Video-ID
    pub async fn retrieve_key(&self, video_id: &VideoId) -> VaultResult<GespeicherterSchluessel> {
        let record = self.repo.get(video_id).await?.ok_or_else(|| {
            VaultError::SchluesselNichtGefunden {
                video_id: video_id.clone(),
            }
        })?;

        let (key, iv) = material_dekodieren(&record)?;
        Ok(GespeicherterSchluessel {
            key,
            iv,
            metadata: record.metadata,
            gespeichert_am: record.stored_at,
        })
    }

    /// Entfernt einen Schluessel; kein Fehler wenn keiner existiert
    pub async fn delete_key(&self, video_id: &VideoId) -> VaultResult<bool> {
        let geloescht = self.repo.delete(video_id).await?;
        if geloescht {
            tracing::info!(video_id = %video_id, "Schluessel geloescht");
        } else {
            tracing::debug!(video_id = %video_id, "Kein Schluessel zum Loeschen vorhanden");
        }
        Ok(geloescht)
    }

    pub async fn all_video_ids(&self) -> VaultResult<Vec<VideoId>> {
        Ok(self.repo.list_ids().await?)
    }

    /// Backup-Dokument aller Schluessel (JSON)
    ///
    /// Das Dokument enthaelt das komplette Schluesselmaterial und muss
    /// entsprechend vertraulich behandelt werden.
    pub async fn export_all_keys(&self) -> VaultResult<String> {
        let records = self.repo.list_all().await?;
        let anzahl = records.len();
        let json = KeyBackup::neu(records).to_json()?;
        tracing::info!(anzahl, "Schluessel exportiert");
        Ok(json)
    }

    /// Liest ein Backup ein
    ///
    /// Alle Eintraege werden vor dem Schreiben geprueft; ist einer
    /// ungueltig, wird nichts uebernommen. Bestehende Eintraege mit
    /// gleicher Video-ID werden ersetzt.
    pub async fn import_keys(&self, json: &str) -> VaultResult<usize> {
        let backup = KeyBackup::parse(json)?;

        for (i, record) in backup.keys.iter().enumerate() {
            if !record.video_id.ist_gueltig() {
                return Err(VaultError::format(format!(
                    "Eintrag {i}: Video-ID darf nicht leer sein"
                )));
            }
            material_dekodieren(record)
                .map_err(|e| VaultError::format(format!("Eintrag {i}: {e}")))?;
        }

        let anzahl = self.repo.upsert_many(&backup.keys).await?;
        tracing::info!(anzahl, "Schluessel importiert");
        Ok(anzahl)
    }

    /// Loescht alle Schluessel unwiderruflich
    pub async fn clear_all_keys(&self, _bestaetigung: LoeschBestaetigung) -> VaultResult<u64> {
        let anzahl = self.repo.clear().await?;
        tracing::warn!(anzahl, "Alle Schluessel geloescht");
        Ok(anzahl)
    }

    pub async fn anzahl(&self) -> VaultResult<u64> {
        Ok(self.repo.count().await?)
    }
}

fn material_dekodieren(record: &KeyRecord) -> VaultResult<(VideoKey, Iv)> {
    let key = import_key(&base64_zu_bytes(&record.key_bytes)?)?;
    let iv = Iv::from_slice(&base64_zu_bytes(&record.iv_bytes)?)?;
    Ok((key, iv))
}
