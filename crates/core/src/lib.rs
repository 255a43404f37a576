//! clipvault-core – Gemeinsame Typen und Fortschritts-Ereignisse
//!
//! Dieses Crate stellt die Bausteine bereit, die von Verschluesselung,
//! Metadaten-Bereinigung und den Upload-/Wiedergabe-Ablaeufen gemeinsam
//! genutzt werden.

pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use event::{Fortschritt, FortschrittsBeobachter, FortschrittsSkala, KeinFortschritt, Stufe};
pub use types::{VideoDatei, VideoId};
