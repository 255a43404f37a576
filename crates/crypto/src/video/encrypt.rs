//! Video-Verschluesselung
//!
//! ## Format
//! ```text
//! [ciphertext][auth_tag(16)]
//! ```
//! Der IV wird nicht vorangestellt, er wird getrennt im lokalen
//! Schluesselspeicher abgelegt.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use clipvault_core::{Fortschritt, FortschrittsBeobachter, Stufe, VideoDatei};

use crate::encoding::sha256_hex;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{
    EncryptionEnvelope, EncryptionMetadata, Iv, VideoKey, ALGORITHMUS, KEY_LAENGE,
    KEY_LAENGE_BITS,
};

/// Verschluesselt eine komplette Videodatei mit einem frischen IV
///
/// Die Datei wird in einem Aufruf verschluesselt (kein Streaming).
/// Fortschritt: 10 (lesen), 30 (verschluesseln), 80 (abschliessen), 100.
pub fn encrypt_video(
    datei: &VideoDatei,
    key: &VideoKey,
    beobachter: &dyn FortschrittsBeobachter,
) -> CryptoResult<EncryptionEnvelope> {
    let iv = Iv::generate()?;

    beobachter.melden(&Fortschritt::neu(
        Stufe::Lesen,
        10,
        "Videodatei wird gelesen...",
    ));

    beobachter.melden(&Fortschritt::neu(
        Stufe::Verschluesseln,
        30,
        "Video wird verschluesselt...",
    ));
    let ciphertext = seal(&datei.daten, key, &iv)?;

    beobachter.melden(&Fortschritt::neu(
        Stufe::Verschluesseln,
        80,
        "Verschluesselung wird abgeschlossen...",
    ));

    let metadata = EncryptionMetadata {
        original_name: datei.name.clone(),
        original_size: datei.groesse(),
        original_type: datei.mime_type.clone(),
        encrypted_size: ciphertext.len() as u64,
        timestamp: chrono::Utc::now().timestamp_millis(),
        algorithm: ALGORITHMUS.to_string(),
        key_length: KEY_LAENGE_BITS,
        ciphertext_sha256: Some(sha256_hex(&ciphertext)),
    };

    tracing::debug!(
        original = datei.groesse(),
        verschluesselt = ciphertext.len(),
        "Video verschluesselt"
    );

    beobachter.melden(&Fortschritt::neu(
        Stufe::Verschluesseln,
        100,
        "Verschluesselung abgeschlossen",
    ));

    Ok(EncryptionEnvelope {
        ciphertext,
        iv,
        metadata,
    })
}

/// AES-256-GCM mit 128-Bit-Tag
pub(crate) fn seal(plaintext: &[u8], key: &VideoKey, iv: &Iv) -> CryptoResult<Vec<u8>> {
    let key_bytes = key.as_bytes();
    if key_bytes.len() != KEY_LAENGE {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: KEY_LAENGE,
            erhalten: key_bytes.len(),
        });
    }

    let key = Key::<Aes256Gcm>::from_slice(key_bytes);
    let cipher = Aes256Gcm::new(key);
    let nonce = AesNonce::from_slice(iv.as_bytes());

    cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
