//! Erkennung des Container-Formats

use serde::Serialize;

use crate::mp4::BoxTyp;

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Unterstuetzte Container-Familien
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// ISO-BMFF (MP4, MOV, M4V, 3GP)
    Mp4,
    /// Matroska/WebM (EBML)
    WebM,
    Unbekannt,
}

impl Container {
    /// Erkennt das Format am MIME-Typ, sonst an den ersten Bytes
    pub fn erkennen(mime_type: &str, daten: &[u8]) -> Self {
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "video/mp4" | "video/quicktime" | "video/x-m4v" | "video/3gpp" | "audio/mp4" => {
                Self::Mp4
            }
            "video/webm" | "audio/webm" | "video/x-matroska" => Self::WebM,
            _ => Self::aus_magic(daten),
        }
    }

    fn aus_magic(daten: &[u8]) -> Self {
        if daten.len() >= 8 && daten[4..8] == BoxTyp::FTYP.0 {
            Self::Mp4
        } else if daten.starts_with(&EBML_MAGIC) {
            Self::WebM
        } else {
            Self::Unbekannt
        }
    }
}
