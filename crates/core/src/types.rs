//! Gemeinsame Identifikations- und Dateitypen
//!
//! Die Video-ID wird vom Server vergeben und ist der Verbindungsschluessel
//! zwischen dem Ciphertext auf dem Server und dem lokal gespeicherten
//! Schluessel. Newtype, damit sie nicht mit Dateinamen verwechselt wird.

use serde::{Deserialize, Serialize};

/// Vom Server vergebene Video-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leere oder nur aus Leerzeichen bestehende IDs sind ungueltig
    pub fn ist_gueltig(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Eine vollstaendig in den Speicher geladene Videodatei
///
/// Entspricht dem `File` des Browsers: Name, MIME-Typ und Inhalt.
/// Es gibt kein Streaming, sehr grosse Dateien sind durch den
/// verfuegbaren Arbeitsspeicher begrenzt.
#[derive(Clone, PartialEq, Eq)]
pub struct VideoDatei {
    pub name: String,
    pub mime_type: String,
    pub daten: Vec<u8>,
}

impl VideoDatei {
    pub fn neu(name: impl Into<String>, mime_type: impl Into<String>, daten: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            daten,
        }
    }

    /// Groesse in Bytes
    pub fn groesse(&self) -> u64 {
        self.daten.len() as u64
    }
}

// Inhalt nicht ausgeben, nur die Laenge
impl std::fmt::Debug for VideoDatei {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDatei")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("groesse", &self.daten.len())
            .finish()
    }
}
