//! UploadOrchestrator – bereinigen, verschluesseln, hochladen, Schluessel speichern
//!
//! Ablauf und Gesamtfortschritt:
//!
//! | Stufe                   | Fortschritt |
//! |-------------------------|-------------|
//! | Metadaten entfernen     | 10 – 30     |
//! | Schluessel erzeugen     | 30          |
//! | Verschluesseln          | 40 – 70     |
//! | Hochladen               | 70 – 90     |
//! | Schluessel speichern    | 90          |
//! | Fertig                  | 100         |
//!
//! Jeder Fehler bricht die restlichen Stufen ab.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clipvault_core::{FortschrittsBeobachter, FortschrittsSkala, Stufe, VideoDatei, VideoId};
use clipvault_crypto::{encrypt_video, generate_key, EncryptionMetadata};
use clipvault_db::KeyRepository;
use clipvault_media::{
    create_anonymous_filename, create_encrypted_filename, strip_metadata, StrippingReport,
};
use clipvault_observability::VaultMetrics;

use crate::backend::{UploadAnfrage, VideoBackend};
use crate::error::{VaultError, VaultResult};
use crate::hintergrund::blockierend;
use crate::key_manager::KeyManager;

/// Benutzerangaben zum Upload
#[derive(Debug, Clone, Default)]
pub struct UploadOptionen {
    pub titel: String,
    pub beschreibung: String,
}

/// Ergebnis eines erfolgreichen Uploads
#[derive(Debug, Clone)]
pub struct UploadErgebnis {
    pub video_id: VideoId,
    pub metadata: EncryptionMetadata,
    pub report: StrippingReport,
    /// Dateiname, unter dem der Ciphertext hochgeladen wurde
    pub upload_name: String,
}

/// Fuehrt Uploads nacheinander aus; ein zweiter gleichzeitiger Aufruf
/// wird mit [`VaultError::UploadLaeuft`] abgewiesen.
pub struct UploadOrchestrator<R: KeyRepository, B: VideoBackend> {
    keys: KeyManager<R>,
    backend: Arc<B>,
    laeuft: AtomicBool,
    metriken: Option<VaultMetrics>,
}

/// Setzt das Laeuft-Flag beim Verlassen zurueck
struct LaufSperre<'a>(&'a AtomicBool);

impl<'a> LaufSperre<'a> {
    fn belegen(flag: &'a AtomicBool) -> VaultResult<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| VaultError::UploadLaeuft)?;
        Ok(Self(flag))
    }
}

impl Drop for LaufSperre<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<R: KeyRepository, B: VideoBackend> UploadOrchestrator<R, B> {
    pub fn neu(keys: KeyManager<R>, backend: Arc<B>) -> Self {
        Self {
            keys,
            backend,
            laeuft: AtomicBool::new(false),
            metriken: None,
        }
    }

    pub fn mit_metriken(mut self, metriken: VaultMetrics) -> Self {
        self.metriken = Some(metriken);
        self
    }

    pub fn laeuft(&self) -> bool {
        self.laeuft.load(Ordering::SeqCst)
    }

    /// Laedt ein Video verschluesselt hoch
    pub async fn hochladen(
        &self,
        datei: &VideoDatei,
        optionen: UploadOptionen,
        beobachter: &dyn FortschrittsBeobachter,
    ) -> VaultResult<UploadErgebnis> {
        let _sperre = LaufSperre::belegen(&self.laeuft)?;

        let ergebnis = self.ablauf(datei, optionen, beobachter).await;
        if let Some(m) = &self.metriken {
            m.upload_zaehlen(ergebnis.is_ok());
            if let Err(e) = &ergebnis {
                m.fehler_zaehlen(e.art());
            }
        }
        ergebnis
    }

    async fn ablauf(
        &self,
        datei: &VideoDatei,
        optionen: UploadOptionen,
        beobachter: &dyn FortschrittsBeobachter,
    ) -> VaultResult<UploadErgebnis> {
        let skala = FortschrittsSkala::neu(beobachter);
        tracing::info!(bytes = datei.groesse(), mime = %datei.mime_type, "Upload gestartet");

        // 1. Metadaten entfernen
        let start = Instant::now();
        skala.melden(Stufe::Bereinigen, 10, "Metadaten werden entfernt...");
        let eingabe = datei.clone();
        let bereinigt = blockierend(&skala.fenster(10, 30), move |b| {
            Ok(strip_metadata(&eingabe, b)?)
        })
        .await?;
        self.stufe_messen("bereinigen", start);
        if let Some(m) = &self.metriken {
            m.metadata_removed_bytes_total
                .inc_by(bereinigt.report.removed_bytes);
        }

        // Der verschluesselte Name landet in den Server-Metadaten
        let mut klartext = bereinigt.datei;
        klartext.name = create_anonymous_filename(&datei.name);

        // 2. Frischer Schluessel fuer jeden Upload
        skala.melden(Stufe::SchluesselErzeugen, 30, "Schluessel wird erzeugt...");
        let key = generate_key()?;

        // 3. Verschluesseln
        let start = Instant::now();
        let klartext_bytes = klartext.groesse();
        let (envelope, key) = blockierend(&skala.fenster(40, 70), move |b| {
            let envelope = encrypt_video(&klartext, &key, b)?;
            Ok((envelope, key))
        })
        .await?;
        self.stufe_messen("verschluesseln", start);
        if let Some(m) = &self.metriken {
            m.encrypted_bytes_total.inc_by(klartext_bytes);
        }

        // 4. Hochladen
        let start = Instant::now();
        skala.melden(Stufe::Hochladen, 70, "Verschluesseltes Video wird hochgeladen...");
        let upload_name = create_encrypted_filename();
        let anfrage = UploadAnfrage {
            dateiname: upload_name.clone(),
            ciphertext: envelope.ciphertext,
            metadata: serde_json::to_string(&envelope.metadata)?,
            titel: optionen.titel,
            beschreibung: optionen.beschreibung,
        };
        let video_id = self.backend.upload(anfrage).await?;
        self.stufe_messen("hochladen", start);

        // 5. Schluessel lokal speichern
        skala.melden(Stufe::SchluesselSpeichern, 90, "Schluessel wird gespeichert...");
        let key_metadata = schluessel_metadaten(&envelope.metadata, &bereinigt.report, &datei.name)?;
        if let Err(e) = self
            .keys
            .store_key(&video_id, &key, &envelope.iv, &key_metadata)
            .await
        {
            // Ohne Schluessel ist der hochgeladene Ciphertext wertlos
            if let Err(loesch_fehler) = self.backend.delete(&video_id).await {
                tracing::warn!(
                    video_id = %video_id,
                    fehler = %loesch_fehler,
                    "Verwaister Ciphertext konnte nicht geloescht werden"
                );
            }
            tracing::error!(video_id = %video_id, fehler = %e, "Schluessel konnte nicht gespeichert werden");
            return Err(e);
        }

        skala.melden(Stufe::Fertig, 100, "Upload abgeschlossen");
        tracing::info!(
            video_id = %video_id,
            entfernt = bereinigt.report.removed_bytes,
            "Upload abgeschlossen"
        );

        Ok(UploadErgebnis {
            video_id,
            metadata: envelope.metadata,
            report: bereinigt.report,
            upload_name,
        })
    }

    fn stufe_messen(&self, stufe: &str, start: Instant) {
        if let Some(m) = &self.metriken {
            m.stufe_beobachten(stufe, start.elapsed().as_secs_f64());
        }
    }
}

/// Lokale Metadaten: Verschluesselungs-Metadaten, Bereinigungs-Bericht
/// und der echte Dateiname (verlaesst das Geraet nicht)
fn schluessel_metadaten(
    metadata: &EncryptionMetadata,
    report: &StrippingReport,
    lokaler_name: &str,
) -> VaultResult<serde_json::Value> {
    let mut wert = serde_json::to_value(metadata)?;
    if let serde_json::Value::Object(map) = &mut wert {
        map.insert("metadataReport".into(), serde_json::to_value(report)?);
        map.insert("localName".into(), lokaler_name.into());
    }
    Ok(wert)
}
