//! Metadaten-Bereinigung vor der Verschluesselung
//!
//! Strategie nach Container-Familie:
//! - MP4: Metadaten-Boxen entfernen, `moov` neu aufbauen
//! - WebM: unveraendert (bekannte Luecke, es wird gewarnt)
//! - Unbekannt: unveraendert (`basic_copy`)

use clipvault_core::{Fortschritt, FortschrittsBeobachter, Stufe, VideoDatei};

use crate::container::Container;
use crate::error::MediaResult;
use crate::mp4;
use crate::report::{Methode, StrippingReport};

/// Bereinigte Datei mit Bericht
#[derive(Debug, Clone)]
pub struct BereinigteDatei {
    pub datei: VideoDatei,
    pub report: StrippingReport,
}

/// Entfernt identifizierende Metadaten aus einem Video
///
/// Name und MIME-Typ der Datei bleiben erhalten; anonymisiert wird erst
/// der Upload-Dateiname.
pub fn strip_metadata(
    datei: &VideoDatei,
    beobachter: &dyn FortschrittsBeobachter,
) -> MediaResult<BereinigteDatei> {
    let melden = |prozent: u8, nachricht: &str| {
        beobachter.melden(&Fortschritt::neu(Stufe::Bereinigen, prozent, nachricht));
    };

    melden(10, "Video wird analysiert...");
    let container = Container::erkennen(&datei.mime_type, &datei.daten);

    let (daten, report) = match container {
        Container::Mp4 => {
            melden(20, "MP4-Struktur wird gelesen...");
            melden(40, "Metadaten-Boxen werden entfernt...");
            let ergebnis = mp4::bereinigen(&datei.daten)?;
            melden(80, "MP4 wird neu aufgebaut...");

            let original = datei.groesse();
            let bereinigt = ergebnis.daten.len() as u64;
            let report = StrippingReport {
                original_size: original,
                cleaned_size: bereinigt,
                removed_bytes: original.saturating_sub(bereinigt),
                methode: Methode::Basic,
                entfernte_boxen: ergebnis.entfernte_boxen,
                hinweise: ergebnis.hinweise,
                // Ungeprueft kopierter Rest kann noch udta/loci enthalten
                metadaten_entfernt: !ergebnis.rest_ungeprueft,
                erweiterte_groesse: ergebnis.erweiterte_groesse,
                abbruch: ergebnis.abbruch.map(|a| a.to_string()),
                timestamp: chrono::Utc::now().timestamp_millis(),
            };
            (ergebnis.daten, report)
        }
        Container::WebM => {
            melden(30, "WebM-Datei wird verarbeitet...");
            tracing::warn!(
                datei = %datei.name,
                "WebM-Metadaten werden nicht entfernt, Datei wird unveraendert uebernommen"
            );
            let mut report = StrippingReport::unveraendert(datei.groesse(), Methode::WebmPassthrough);
            report
                .hinweise
                .push("WebM/EBML wird nicht bereinigt; Metadaten bleiben erhalten".into());
            (datei.daten.clone(), report)
        }
        Container::Unbekannt => {
            melden(50, "Unbekanntes Format, Datei wird kopiert...");
            (
                datei.daten.clone(),
                StrippingReport::unveraendert(datei.groesse(), Methode::BasicCopy),
            )
        }
    };

    tracing::info!(
        methode = %report.methode,
        original = report.original_size,
        bereinigt = report.cleaned_size,
        boxen = report.entfernte_boxen.len(),
        "Metadaten-Bereinigung abgeschlossen"
    );
    melden(100, "Metadaten entfernt");

    Ok(BereinigteDatei {
        datei: VideoDatei::neu(datei.name.clone(), datei.mime_type.clone(), daten),
        report,
    })
}
