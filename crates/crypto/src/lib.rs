//! # clipvault-crypto
//!
//! Clientseitige Ende-zu-Ende Verschluesselung von Videodateien.
//! Der Server bekommt nur Ciphertext zu sehen, der Schluessel verlaesst
//! das Geraet nie.
//!
//! ## Module
//! - `video` - Schluessel erzeugen, Video ver-/entschluesseln (AES-256-GCM)
//! - `encoding` - Base64 und SHA-256 Hilfsfunktionen
//! - `types` - Gemeinsame Typen (VideoKey, Iv, EncryptionEnvelope, etc.)
//! - `error` - Fehlertypen

pub mod encoding;
pub mod error;
pub mod types;
pub mod video;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use types::{
    EncryptionEnvelope, EncryptionMetadata, Iv, SecretBytes, VideoKey, ALGORITHMUS, IV_LAENGE,
    KEY_LAENGE_BITS, TAG_LAENGE_BITS,
};

pub use video::{
    decrypt_video, encrypt_video, export_key, generate_key, import_key, plattform_pruefen,
};
