//! Fehlertypen fuer Upload, Wiedergabe und Schluesselverwaltung
//!
//! Fehler der unteren Schichten werden per `From` in eine der
//! Fehlerarten uebersetzt, die dem Benutzer als einzelne Meldung
//! angezeigt werden.

use clipvault_core::VideoId;
use clipvault_crypto::CryptoError;
use clipvault_db::DbError;
use clipvault_media::MediaError;
use thiserror::Error;

/// clipvault-Fehlertypen
#[derive(Debug, Error)]
pub enum VaultError {
    /// Krypto-Primitive oder Schluesselspeicher fehlen (fatal)
    #[error("Plattform nicht unterstuetzt: {0}")]
    PlattformNichtUnterstuetzt(String),

    /// Auth-Tag-Pruefung fehlgeschlagen
    #[error("Entschluesselung fehlgeschlagen: Schluessel oder IV passen nicht, oder die Daten wurden veraendert")]
    AuthentifizierungFehlgeschlagen,

    #[error("Kein Schluessel fuer Video '{video_id}' gefunden. Der Schluessel wurde nie auf diesem Geraet gespeichert und kann nicht vom Server wiederhergestellt werden")]
    SchluesselNichtGefunden { video_id: VideoId },

    #[error("Ungueltiges Format: {0}")]
    UngueltigesFormat(String),

    /// Upload- oder Download-Fehler; Wiederholung des gesamten Ablaufs ist sicher
    #[error("Netzwerkfehler: {0}")]
    Netzwerk(String),

    #[error("Es laeuft bereits ein Upload")]
    UploadLaeuft,

    #[error("Diese Aktion muss ausdruecklich bestaetigt werden")]
    BestaetigungFehlt,

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Schluesselspeicher-Fehler: {0}")]
    Speicher(#[source] DbError),
}

pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Nur Netzwerkfehler duerfen (durch erneutes Ausfuehren des ganzen Ablaufs) wiederholt werden
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::Netzwerk(_))
    }

    /// Kurzname fuer Metriken und Logs
    pub fn art(&self) -> &'static str {
        match self {
            Self::PlattformNichtUnterstuetzt(_) => "plattform",
            Self::AuthentifizierungFehlgeschlagen => "authentifizierung",
            Self::SchluesselNichtGefunden { .. } => "schluessel_fehlt",
            Self::UngueltigesFormat(_) => "format",
            Self::Netzwerk(_) => "netzwerk",
            Self::UploadLaeuft => "upload_laeuft",
            Self::BestaetigungFehlt => "bestaetigung",
            Self::Verschluesselung(_) => "verschluesselung",
            Self::Speicher(_) => "speicher",
        }
    }

    pub fn netzwerk(msg: impl Into<String>) -> Self {
        Self::Netzwerk(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::UngueltigesFormat(msg.into())
    }
}

impl From<CryptoError> for VaultError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::PlattformNichtUnterstuetzt(msg) => Self::PlattformNichtUnterstuetzt(msg),
            CryptoError::Authentifizierung => Self::AuthentifizierungFehlgeschlagen,
            CryptoError::Verschluesselung(msg) => Self::Verschluesselung(msg),
            andere => Self::UngueltigesFormat(andere.to_string()),
        }
    }
}

impl From<DbError> for VaultError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UngueltigesFormat(msg) => Self::UngueltigesFormat(msg),
            andere => Self::Speicher(andere),
        }
    }
}

impl From<MediaError> for VaultError {
    fn from(e: MediaError) -> Self {
        Self::UngueltigesFormat(e.to_string())
    }
}

impl From<reqwest::Error> for VaultError {
    fn from(e: reqwest::Error) -> Self {
        Self::Netzwerk(e.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        Self::UngueltigesFormat(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nur_netzwerk_ist_wiederholbar() {
        assert!(VaultError::netzwerk("timeout").ist_wiederholbar());
        assert!(!VaultError::AuthentifizierungFehlgeschlagen.ist_wiederholbar());
        assert!(!VaultError::format("x").ist_wiederholbar());
        assert!(!VaultError::UploadLaeuft.ist_wiederholbar());
    }

    #[test]
    fn krypto_fehler_uebersetzen() {
        assert!(matches!(
            VaultError::from(CryptoError::Authentifizierung),
            VaultError::AuthentifizierungFehlgeschlagen
        ));
        assert!(matches!(
            VaultError::from(CryptoError::PlattformNichtUnterstuetzt("rng".into())),
            VaultError::PlattformNichtUnterstuetzt(_)
        ));
        assert!(matches!(
            VaultError::from(CryptoError::UngueltigeIvLaenge {
                erwartet: 12,
                erhalten: 3
            }),
            VaultError::UngueltigesFormat(_)
        ));
    }

    #[test]
    fn db_formatfehler_bleibt_formatfehler() {
        assert!(matches!(
            VaultError::from(DbError::format("keys fehlt")),
            VaultError::UngueltigesFormat(_)
        ));
        assert!(matches!(
            VaultError::from(DbError::intern("x")),
            VaultError::Speicher(_)
        ));
    }

    #[test]
    fn schluessel_fehlt_meldung() {
        let e = VaultError::SchluesselNichtGefunden {
            video_id: VideoId::from("v9"),
        };
        let text = e.to_string();
        assert!(text.contains("v9"));
        assert!(text.contains("nie auf diesem Geraet"));
        assert_eq!(e.art(), "schluessel_fehlt");
    }
}
