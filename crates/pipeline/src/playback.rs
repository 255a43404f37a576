//! PlaybackOrchestrator – Schluessel laden, herunterladen, entschluesseln

use std::sync::Arc;
use std::time::Instant;

use clipvault_core::{FortschrittsBeobachter, FortschrittsSkala, Stufe, VideoId};
use clipvault_crypto::decrypt_video;
use clipvault_crypto::encoding::sha256_hex;
use clipvault_db::KeyRepository;
use clipvault_observability::VaultMetrics;

use crate::backend::VideoBackend;
use crate::blob::{BlobRegistry, Wiedergabe};
use crate::error::{VaultError, VaultResult};
use crate::hintergrund::blockierend;
use crate::key_manager::KeyManager;

/// MIME-Typ wenn die Metadaten keinen enthalten
const STANDARD_MIME: &str = "video/mp4";

pub struct PlaybackOrchestrator<R: KeyRepository, B: VideoBackend> {
    keys: KeyManager<R>,
    backend: Arc<B>,
    blobs: Arc<BlobRegistry>,
    metriken: Option<VaultMetrics>,
}

impl<R: KeyRepository, B: VideoBackend> PlaybackOrchestrator<R, B> {
    pub fn neu(keys: KeyManager<R>, backend: Arc<B>, blobs: Arc<BlobRegistry>) -> Self {
        Self {
            keys,
            backend,
            blobs,
            metriken: None,
        }
    }

    pub fn mit_metriken(mut self, metriken: VaultMetrics) -> Self {
        self.metriken = Some(metriken);
        self
    }

    pub fn blobs(&self) -> &Arc<BlobRegistry> {
        &self.blobs
    }

    /// Stellt ein Video zur Wiedergabe bereit
    ///
    /// Fortschritt: Schluessel 10, Download 20 – 50, Entschluesseln
    /// 50 – 90, Blob-URL 100.
    pub async fn abspielen(
        &self,
        video_id: &VideoId,
        beobachter: &dyn FortschrittsBeobachter,
    ) -> VaultResult<Wiedergabe> {
        let ergebnis = self.ablauf(video_id, beobachter).await;
        if let Some(m) = &self.metriken {
            m.wiedergabe_zaehlen(ergebnis.is_ok());
            if let Err(e) = &ergebnis {
                m.fehler_zaehlen(e.art());
            }
        }
        ergebnis
    }

    async fn ablauf(
        &self,
        video_id: &VideoId,
        beobachter: &dyn FortschrittsBeobachter,
    ) -> VaultResult<Wiedergabe> {
        let skala = FortschrittsSkala::neu(beobachter);

        // Ohne lokalen Schluessel ist der Download sinnlos
        skala.melden(Stufe::SchluesselLaden, 10, "Schluessel wird geladen...");
        let gespeichert = self.keys.retrieve_key(video_id).await?;

        let start = Instant::now();
        skala.melden(Stufe::Herunterladen, 20, "Verschluesseltes Video wird geladen...");
        let ciphertext = self.backend.fetch_encrypted(video_id).await?;
        self.stufe_messen("herunterladen", start);

        let erwartet = gespeichert
            .metadata
            .get("ciphertextSha256")
            .and_then(|v| v.as_str())
            .map(str::to_owned);

        let start = Instant::now();
        skala.melden(Stufe::Entschluesseln, 50, "Video wird entschluesselt...");
        let key = gespeichert.key.clone();
        let iv = gespeichert.iv;
        let klartext = blockierend(&skala.fenster(50, 90), move |b| {
            if let Some(erwartet) = erwartet {
                // Veraenderte Daten auf dem Server sind kein Uebertragungsfehler
                if !sha256_hex(&ciphertext).eq_ignore_ascii_case(&erwartet) {
                    return Err(VaultError::AuthentifizierungFehlgeschlagen);
                }
            }
            Ok(decrypt_video(&ciphertext, &key, &iv, b)?)
        })
        .await
        .inspect_err(|e| {
            tracing::warn!(video_id = %video_id, fehler = %e, "Entschluesselung fehlgeschlagen");
        })?;
        self.stufe_messen("entschluesseln", start);
        if let Some(m) = &self.metriken {
            m.decrypted_bytes_total.inc_by(klartext.len() as u64);
        }

        let mime_type = gespeichert
            .metadata
            .get("originalType")
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(STANDARD_MIME);
        let bytes = klartext.len();
        let url = self.blobs.create_video_url(klartext, mime_type);

        skala.melden(Stufe::Wiedergabe, 100, "Video bereit");
        tracing::info!(video_id = %video_id, bytes, mime = mime_type, "Video entschluesselt");

        Ok(Wiedergabe::neu(url, video_id.clone(), Arc::clone(&self.blobs)))
    }

    /// Loescht ein Video auf dem Server und danach den lokalen Schluessel
    pub async fn loeschen(&self, video_id: &VideoId) -> VaultResult<()> {
        self.backend.delete(video_id).await?;
        self.keys.delete_key(video_id).await?;
        Ok(())
    }

    fn stufe_messen(&self, stufe: &str, start: Instant) {
        if let Some(m) = &self.metriken {
            m.stufe_beobachten(stufe, start.elapsed().as_secs_f64());
        }
    }
}
