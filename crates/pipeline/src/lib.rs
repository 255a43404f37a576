//! clipvault-pipeline – Upload- und Wiedergabe-Ablaeufe
//!
//! Verbindet Metadaten-Bereinigung, Verschluesselung, Server und lokalen
//! Schluesselspeicher zu den beiden Ablaeufen, die der Benutzer sieht.
//!
//! # Module
//! - `key_manager` – Schluessel speichern, laden, sichern, wiederherstellen
//! - `context`     – Einmal geoeffnete Datenbank, Plattform-Pruefung
//! - `backend`     – Server-Trait und HTTP-Implementierung
//! - `upload`      – bereinigen, verschluesseln, hochladen, speichern
//! - `playback`    – laden, entschluesseln, Blob-URL
//! - `blob`        – Blob-URL-Registry
//! - `hintergrund` – Blocking-Pool fuer Bereinigen und Krypto

pub mod backend;
pub mod blob;
pub mod context;
pub mod error;
mod hintergrund;
pub mod key_manager;
pub mod playback;
pub mod upload;

#[cfg(test)]
mod tests;

pub use backend::{HttpVideoBackend, UploadAnfrage, VideoBackend};
pub use blob::{BlobRegistry, VideoBlob, Wiedergabe};
pub use context::VaultContext;
pub use error::{VaultError, VaultResult};
pub use key_manager::{GespeicherterSchluessel, KeyManager, LoeschBestaetigung};
pub use playback::PlaybackOrchestrator;
pub use upload::{UploadErgebnis, UploadOptionen, UploadOrchestrator};
