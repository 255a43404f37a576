//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Kryptografie auf dieser Plattform nicht verfuegbar: {0}")]
    PlattformNichtUnterstuetzt(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    /// Auth-Tag stimmt nicht: falscher Schluessel/IV oder manipulierte Daten
    #[error("Entschluesselung fehlgeschlagen: Integritaetspruefung (Auth-Tag) ungueltig")]
    Authentifizierung,

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige IV-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeIvLaenge { erwartet: usize, erhalten: usize },

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl CryptoError {
    /// Gibt true zurueck wenn die Integritaetspruefung fehlgeschlagen ist
    pub fn ist_authentifizierung(&self) -> bool {
        matches!(self, Self::Authentifizierung)
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
