//! Metadaten-Analyse vor der Bereinigung (nur lesend)

use clipvault_core::VideoDatei;
use serde::Serialize;

use crate::container::Container;
use crate::mp4::{self, BoxInfo};

/// Welche Metadaten eine Datei enthaelt
#[derive(Debug, Clone, Serialize)]
pub struct MetadataAnalyse {
    pub name: String,
    pub groesse: u64,
    pub mime_type: String,
    pub container: Container,
    /// Alle gefundenen Boxen (nur MP4)
    pub boxen: Vec<BoxInfo>,
    /// Pfade der Metadaten-Boxen
    pub metadaten: Vec<String>,
    pub erweiterte_groesse: bool,
    pub abbruch: Option<String>,
    pub hinweis: Option<String>,
}

impl MetadataAnalyse {
    pub fn hat_metadaten(&self) -> bool {
        !self.metadaten.is_empty()
    }
}

/// Analysiert eine Datei ohne sie zu veraendern
pub fn analysieren(datei: &VideoDatei) -> MetadataAnalyse {
    let container = Container::erkennen(&datei.mime_type, &datei.daten);

    let mut analyse = MetadataAnalyse {
        name: datei.name.clone(),
        groesse: datei.groesse(),
        mime_type: datei.mime_type.clone(),
        container,
        boxen: Vec::new(),
        metadaten: Vec::new(),
        erweiterte_groesse: false,
        abbruch: None,
        hinweis: None,
    };

    match container {
        Container::Mp4 => {
            let (boxen, abbruch, erweitert) = mp4::boxen_auflisten(&datei.daten);
            analyse.metadaten = boxen
                .iter()
                .filter(|b| b.metadaten)
                .map(|b| b.pfad.clone())
                .collect();
            analyse.boxen = boxen;
            analyse.erweiterte_groesse = erweitert;
            analyse.abbruch = abbruch.map(|a| a.to_string());
        }
        Container::WebM => {
            analyse.hinweis = Some("WebM/EBML-Metadaten werden nicht analysiert".into());
        }
        Container::Unbekannt => {
            analyse.hinweis = Some("Unbekanntes Container-Format".into());
        }
    }

    analyse
}
