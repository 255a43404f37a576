//! Ausfuehrung der Unterbefehle

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clipvault_core::{Fortschritt, KeinFortschritt, VideoDatei, VideoId};
use clipvault_db::SqliteDb;
use clipvault_media::{analysieren, strip_metadata, MetadataAnalyse, StrippingReport};
use clipvault_observability::VaultMetrics;
use clipvault_pipeline::{
    BlobRegistry, HttpVideoBackend, KeyManager, LoeschBestaetigung, PlaybackOrchestrator,
    UploadErgebnis, UploadOptionen, UploadOrchestrator, VaultContext,
};

use crate::args::{Befehl, KeysBefehl};
use crate::config::CliConfig;

/// Alles was ein Befehl zur Laufzeit braucht
pub struct Sitzung {
    pub config: CliConfig,
    pub ctx: VaultContext,
    pub metriken: VaultMetrics,
}

impl Sitzung {
    pub fn neu(config: CliConfig) -> Result<Self> {
        let ctx = VaultContext::neu(config.datenbank_config());
        Ok(Self {
            config,
            ctx,
            metriken: VaultMetrics::neu()?,
        })
    }

    /// Sitzung mit vorhandenem Kontext (Tests)
    pub fn mit_kontext(config: CliConfig, ctx: VaultContext) -> Result<Self> {
        Ok(Self {
            config,
            ctx,
            metriken: VaultMetrics::neu()?,
        })
    }

    fn backend(&self) -> Result<Arc<HttpVideoBackend>> {
        let backend = HttpVideoBackend::neu(&self.config.server.base_url, self.config.server_timeout())?;
        Ok(Arc::new(backend))
    }

    async fn key_manager(&self) -> Result<KeyManager<SqliteDb>> {
        Ok(self.ctx.key_manager().await?)
    }

    /// Fuehrt einen Befehl aus und schreibt das Ergebnis nach stdout
    pub async fn ausfuehren(&self, befehl: Befehl) -> Result<()> {
        match befehl {
            Befehl::Status => {
                let anzahl = self.status().await?;
                println!("Plattform: OK (AES-256-GCM verfuegbar)");
                println!("Schluesselspeicher: {}", self.config.datenbank.url);
                println!("Gespeicherte Schluessel: {anzahl}");
            }
            Befehl::Upload {
                datei,
                titel,
                beschreibung,
                mime,
            } => {
                let ergebnis = self
                    .upload(&datei, mime.as_deref(), UploadOptionen { titel, beschreibung })
                    .await?;
                println!("{}", ergebnis.video_id);
            }
            Befehl::Play { video_id, ausgabe } => {
                let bytes = self.play(&VideoId::new(video_id), &ausgabe).await?;
                eprintln!("{bytes} Bytes nach '{}' geschrieben", ausgabe.display());
            }
            Befehl::Delete { video_id } => {
                let video_id = VideoId::new(video_id);
                self.delete(&video_id).await?;
                println!("Video '{video_id}' geloescht");
            }
            Befehl::Strip {
                datei,
                ausgabe,
                mime,
            } => {
                let report = self.strip(&datei, &ausgabe, mime.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Befehl::Analyse { datei, mime } => {
                let analyse = analyse(&datei, mime.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&analyse)?);
            }
            Befehl::Keys { befehl } => self.keys(befehl).await?,
        }
        Ok(())
    }

    /// Plattform pruefen und Datenbank oeffnen; liefert die Anzahl Schluessel
    pub async fn status(&self) -> Result<u64> {
        let km = self.key_manager().await?;
        Ok(km.anzahl().await?)
    }

    pub async fn upload(
        &self,
        pfad: &Path,
        mime: Option<&str>,
        optionen: UploadOptionen,
    ) -> Result<UploadErgebnis> {
        let datei = datei_laden(pfad, mime).await?;
        let orchestrator = UploadOrchestrator::neu(self.key_manager().await?, self.backend()?)
            .mit_metriken(self.metriken.clone());
        let ergebnis = orchestrator
            .hochladen(&datei, optionen, &fortschritt_anzeigen)
            .await?;

        for hinweis in &ergebnis.report.hinweise {
            tracing::warn!(hinweis = %hinweis, "Hinweis zur Metadaten-Bereinigung");
        }
        Ok(ergebnis)
    }

    /// Entschluesselt ein Video in eine Datei; gibt die Anzahl Bytes zurueck
    pub async fn play(&self, video_id: &VideoId, ausgabe: &Path) -> Result<usize> {
        let orchestrator = PlaybackOrchestrator::neu(
            self.key_manager().await?,
            self.backend()?,
            BlobRegistry::neu(),
        )
        .mit_metriken(self.metriken.clone());

        let wiedergabe = orchestrator
            .abspielen(video_id, &fortschritt_anzeigen)
            .await?;
        let blob = wiedergabe
            .blob()
            .context("Blob-URL wurde vorzeitig widerrufen")?;
        tokio::fs::write(ausgabe, blob.daten.as_slice())
            .await
            .with_context(|| format!("'{}' nicht schreibbar", ausgabe.display()))?;
        wiedergabe.schliessen();
        Ok(blob.daten.len())
    }

    pub async fn delete(&self, video_id: &VideoId) -> Result<()> {
        let orchestrator = PlaybackOrchestrator::neu(
            self.key_manager().await?,
            self.backend()?,
            BlobRegistry::neu(),
        );
        orchestrator.loeschen(video_id).await?;
        Ok(())
    }

    pub async fn strip(
        &self,
        pfad: &Path,
        ausgabe: &Path,
        mime: Option<&str>,
    ) -> Result<StrippingReport> {
        let datei = datei_laden(pfad, mime).await?;
        let bereinigt = strip_metadata(&datei, &KeinFortschritt)?;
        tokio::fs::write(ausgabe, &bereinigt.datei.daten)
            .await
            .with_context(|| format!("'{}' nicht schreibbar", ausgabe.display()))?;
        self.metriken
            .metadata_removed_bytes_total
            .inc_by(bereinigt.report.removed_bytes);
        Ok(bereinigt.report)
    }

    async fn keys(&self, befehl: KeysBefehl) -> Result<()> {
        let km = self.key_manager().await?;
        match befehl {
            KeysBefehl::List => {
                for id in km.all_video_ids().await? {
                    println!("{id}");
                }
            }
            KeysBefehl::Export { ausgabe } => {
                let json = km.export_all_keys().await?;
                match ausgabe {
                    Some(pfad) => {
                        tokio::fs::write(&pfad, json)
                            .await
                            .with_context(|| format!("'{}' nicht schreibbar", pfad.display()))?;
                        eprintln!("Backup nach '{}' geschrieben. Datei sicher aufbewahren!", pfad.display());
                    }
                    None => println!("{json}"),
                }
            }
            KeysBefehl::Import { datei } => {
                let json = tokio::fs::read_to_string(&datei)
                    .await
                    .with_context(|| format!("'{}' nicht lesbar", datei.display()))?;
                let anzahl = km.import_keys(&json).await?;
                println!("{anzahl} Schluessel importiert");
            }
            KeysBefehl::Delete { video_id } => {
                if km.delete_key(&VideoId::new(video_id)).await? {
                    println!("Schluessel geloescht");
                } else {
                    println!("Kein Schluessel vorhanden");
                }
            }
            KeysBefehl::Clear { ja } => {
                let anzahl = km.clear_all_keys(LoeschBestaetigung::aus_flag(ja)?).await?;
                println!("{anzahl} Schluessel geloescht");
            }
        }
        Ok(())
    }
}

pub async fn analyse(pfad: &Path, mime: Option<&str>) -> Result<MetadataAnalyse> {
    let datei = datei_laden(pfad, mime).await?;
    Ok(analysieren(&datei))
}

/// Liest eine Datei komplett ein
pub async fn datei_laden(pfad: &Path, mime: Option<&str>) -> Result<VideoDatei> {
    let daten = tokio::fs::read(pfad)
        .await
        .with_context(|| format!("'{}' nicht lesbar", pfad.display()))?;
    let name = pfad
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = mime.unwrap_or_else(|| mime_aus_endung(pfad));
    Ok(VideoDatei::neu(name, mime, daten))
}

/// MIME-Typ anhand der Dateiendung
pub fn mime_aus_endung(pfad: &Path) -> &'static str {
    let endung = pfad
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match endung.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        "3gp" => "video/3gpp",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

fn fortschritt_anzeigen(f: &Fortschritt) {
    eprintln!("[{:>3}%] {}", f.prozent, f.nachricht);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp4_box(typ: &[u8; 4], inhalt: &[u8]) -> Vec<u8> {
        let mut b = ((inhalt.len() + 8) as u32).to_be_bytes().to_vec();
        b.extend_from_slice(typ);
        b.extend_from_slice(inhalt);
        b
    }

    async fn test_sitzung() -> Sitzung {
        let db = SqliteDb::in_memory().await.unwrap();
        Sitzung::mit_kontext(CliConfig::default(), VaultContext::mit_db(db)).unwrap()
    }

    #[test]
    fn mime_typen() {
        assert_eq!(mime_aus_endung(Path::new("a.MP4")), "video/mp4");
        assert_eq!(mime_aus_endung(Path::new("a.mov")), "video/quicktime");
        assert_eq!(mime_aus_endung(Path::new("a.webm")), "video/webm");
        assert_eq!(mime_aus_endung(Path::new("ohne")), "application/octet-stream");
    }

    #[tokio::test]
    async fn strip_schreibt_bereinigte_datei() {
        let dir = tempfile::tempdir().unwrap();
        let eingabe = dir.path().join("clip.mp4");
        let ausgabe = dir.path().join("clip-sauber.mp4");
        let udta = mp4_box(b"udta", &mp4_box(b"\xA9xyz", b"+52.52+013.40/"));
        let inhalt = [
            mp4_box(b"ftyp", b"isom"),
            mp4_box(b"moov", &[mp4_box(b"mvhd", &[0; 8]), udta.clone()].concat()),
            mp4_box(b"mdat", &[1; 32]),
        ]
        .concat();
        std::fs::write(&eingabe, &inhalt).unwrap();

        let sitzung = test_sitzung().await;
        let report = sitzung.strip(&eingabe, &ausgabe, None).await.unwrap();

        let sauber = std::fs::read(&ausgabe).unwrap();
        assert_eq!(report.removed_bytes, udta.len() as u64);
        assert_eq!(sauber.len(), inhalt.len() - udta.len());
        assert!(!sauber.windows(4).any(|w| w == b"udta"));
        assert_eq!(
            sitzung.metriken.metadata_removed_bytes_total.get(),
            udta.len() as u64
        );
    }

    #[tokio::test]
    async fn analyse_findet_metadaten() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("clip.mov");
        let inhalt = [
            mp4_box(b"ftyp", b"qt  "),
            mp4_box(b"moov", &mp4_box(b"meta", &[0; 4])),
        ]
        .concat();
        std::fs::write(&pfad, inhalt).unwrap();

        let analyse = analyse(&pfad, None).await.unwrap();
        assert_eq!(analyse.mime_type, "video/quicktime");
        assert!(analyse.hat_metadaten());
    }

    #[tokio::test]
    async fn status_zaehlt_schluessel() {
        let sitzung = test_sitzung().await;
        assert_eq!(sitzung.status().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_ohne_ja_schlaegt_fehl() {
        let sitzung = test_sitzung().await;
        let err = sitzung
            .keys(KeysBefehl::Clear { ja: false })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bestaetigt"));
    }

    #[tokio::test]
    async fn fehlende_datei_ist_fehler() {
        let err = datei_laden(Path::new("/gibt/es/nicht.mp4"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nicht lesbar"));
    }
}
