//! Video-Schluessel erzeugen, exportieren und importieren
//!
//! Pro Video wird ein eigener AES-256-Schluessel erzeugt. Schluessel sind
//! exportierbar, damit sie lokal gespeichert werden koennen.

use aes_gcm::aead::{rand_core::RngCore, OsRng};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Iv, VideoKey, KEY_LAENGE};
use crate::video::{decrypt::open, encrypt::seal};

/// Erzeugt einen neuen AES-256-GCM-Schluessel
///
/// Schlaegt nur fehl wenn der Zufallsgenerator des Betriebssystems
/// nicht verfuegbar ist.
pub fn generate_key() -> CryptoResult<VideoKey> {
    let mut key_bytes = vec![0u8; KEY_LAENGE];
    OsRng
        .try_fill_bytes(&mut key_bytes)
        .map_err(|e| CryptoError::PlattformNichtUnterstuetzt(e.to_string()))?;
    VideoKey::aus_bytes(key_bytes)
}

/// Exportiert einen Schluessel als rohe Bytes
pub fn export_key(key: &VideoKey) -> Vec<u8> {
    key.as_bytes().to_vec()
}

/// Importiert einen Schluessel aus rohen Bytes (32 Bytes)
pub fn import_key(bytes: &[u8]) -> CryptoResult<VideoKey> {
    VideoKey::aus_bytes(bytes.to_vec())
}

/// Prueft ob alle benoetigten Primitive funktionieren
///
/// Erzeugt Schluessel und IV und fuehrt einen Ver-/Entschluesselungs-Probelauf
/// durch. Muss vor jeder anderen Operation aufgerufen werden.
pub fn plattform_pruefen() -> CryptoResult<()> {
    const SELBSTTEST: &[u8] = b"clipvault-plattform-selbsttest";

    let key = generate_key()?;
    let iv = Iv::generate()?;

    let ciphertext = seal(SELBSTTEST, &key, &iv)
        .map_err(|e| CryptoError::PlattformNichtUnterstuetzt(e.to_string()))?;
    let klartext = open(&ciphertext, &key, &iv)
        .map_err(|e| CryptoError::PlattformNichtUnterstuetzt(e.to_string()))?;

    if klartext != SELBSTTEST {
        return Err(CryptoError::PlattformNichtUnterstuetzt(
            "Probelauf lieferte abweichenden Klartext".into(),
        ));
    }

    tracing::debug!("Kryptografie-Probelauf erfolgreich");
    Ok(())
}
