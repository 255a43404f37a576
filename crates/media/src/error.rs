//! Fehlertypen fuer das Media-Crate

use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

/// Fehler beim Lesen oder Umbauen eines Containers
#[derive(Debug, Error)]
pub enum MediaError {
    /// Lesezugriff ueber das Ende der Daten hinaus
    #[error("Daten abgeschnitten bei Offset {position}: {benoetigt} Bytes benoetigt, {verfuegbar} verfuegbar")]
    Abgeschnitten {
        position: usize,
        benoetigt: usize,
        verfuegbar: usize,
    },

    /// Box-Struktur innerhalb von `moov` ist nicht rekonstruierbar
    #[error("Ungueltige Box-Struktur: {0}")]
    UngueltigeBox(String),
}

impl MediaError {
    pub fn ungueltige_box(msg: impl Into<String>) -> Self {
        Self::UngueltigeBox(msg.into())
    }
}
