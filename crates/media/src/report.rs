//! Bericht ueber eine Metadaten-Bereinigung
//!
//! Der Bericht wird als JSON in die Schluessel-Metadaten uebernommen; die
//! Feldnamen entsprechen dem Format der Browser-Variante.

use serde::{Deserialize, Serialize};

/// Verwendete Bereinigungs-Methode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Methode {
    /// ISO-BMFF Box-Bereinigung
    Basic,
    /// Unbekanntes Format, unveraendert kopiert
    BasicCopy,
    /// WebM/EBML, unveraendert kopiert (Metadaten bleiben erhalten)
    WebmPassthrough,
}

impl Methode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::BasicCopy => "basic_copy",
            Self::WebmPassthrough => "webm_passthrough",
        }
    }
}

impl std::fmt::Display for Methode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eine entfernte Box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntfernteBox {
    /// z.B. "moov/trak/udta"
    #[serde(rename = "path")]
    pub pfad: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub offset: u64,
    #[serde(rename = "size")]
    pub groesse: u64,
}

/// Ergebnis einer Bereinigung, auch wenn nichts entfernt wurde
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrippingReport {
    pub original_size: u64,
    pub cleaned_size: u64,
    pub removed_bytes: u64,
    #[serde(rename = "method")]
    pub methode: Methode,
    #[serde(rename = "removedAtoms", default)]
    pub entfernte_boxen: Vec<EntfernteBox>,
    #[serde(rename = "notes", default)]
    pub hinweise: Vec<String>,
    #[serde(rename = "metadataRemoved")]
    pub metadaten_entfernt: bool,
    #[serde(rename = "extendedSize", default)]
    pub erweiterte_groesse: bool,
    #[serde(rename = "parseStop", default, skip_serializing_if = "Option::is_none")]
    pub abbruch: Option<String>,
    /// Unix-Zeit in Millisekunden
    pub timestamp: i64,
}

impl StrippingReport {
    /// Bericht fuer eine unveraenderte Kopie
    pub fn unveraendert(groesse: u64, methode: Methode) -> Self {
        Self {
            original_size: groesse,
            cleaned_size: groesse,
            removed_bytes: 0,
            methode,
            entfernte_boxen: Vec::new(),
            hinweise: Vec::new(),
            metadaten_entfernt: false,
            erweiterte_groesse: false,
            abbruch: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
