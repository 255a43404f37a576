//! Video-Entschluesselung
//!
//! Verifiziert den Auth-Tag. Ein Fehlschlag wird als
//! [`CryptoError::Authentifizierung`] gemeldet und nie mit IO- oder
//! Netzwerkfehlern vermischt.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use clipvault_core::{Fortschritt, FortschrittsBeobachter, Stufe};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Iv, VideoKey, KEY_LAENGE};

/// Entschluesselt einen Video-Ciphertext
///
/// Fortschritt: 20 (entschluesseln), 100.
pub fn decrypt_video(
    ciphertext: &[u8],
    key: &VideoKey,
    iv: &Iv,
    beobachter: &dyn FortschrittsBeobachter,
) -> CryptoResult<Vec<u8>> {
    beobachter.melden(&Fortschritt::neu(
        Stufe::Entschluesseln,
        20,
        "Video wird entschluesselt...",
    ));

    let plaintext = open(ciphertext, key, iv)?;

    beobachter.melden(&Fortschritt::neu(
        Stufe::Entschluesseln,
        100,
        "Entschluesselung abgeschlossen",
    ));

    Ok(plaintext)
}

pub(crate) fn open(ciphertext: &[u8], key: &VideoKey, iv: &Iv) -> CryptoResult<Vec<u8>> {
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

    cipher.decrypt(nonce, ciphertext).map_err(|_| {
        tracing::warn!(bytes = ciphertext.len(), "Auth-Tag-Pruefung fehlgeschlagen");
        CryptoError::Authentifizierung
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::encrypt::encrypt_video;
    use crate::video::key::{export_key, generate_key, import_key};
    use clipvault_core::{KeinFortschritt, VideoDatei};

    fn datei(daten: &[u8]) -> VideoDatei {
        VideoDatei::neu("clip.mp4", "video/mp4", daten.to_vec())
    }

    #[test]
    fn roundtrip() {
        let key = generate_key().unwrap();
        let plaintext = b"moov mdat Testinhalt 1234567890abcdef";

        let envelope = encrypt_video(&datei(plaintext), &key, &KeinFortschritt).unwrap();
        let decrypted =
            decrypt_video(&envelope.ciphertext, &key, &envelope.iv, &KeinFortschritt).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn falscher_schluessel_schlaegt_fehl() {
        let key1 = generate_key().unwrap();
        let key2 = generate_key().unwrap();

        let envelope = encrypt_video(&datei(b"geheim"), &key1, &KeinFortschritt).unwrap();
        let result = decrypt_video(&envelope.ciphertext, &key2, &envelope.iv, &KeinFortschritt);

        assert!(matches!(result, Err(CryptoError::Authentifizierung)));
    }

    #[test]
    fn falscher_iv_schlaegt_fehl() {
        let key = generate_key().unwrap();
        let envelope = encrypt_video(&datei(b"geheim"), &key, &KeinFortschritt).unwrap();
        let anderer = Iv::from_slice(&[7u8; 12]).unwrap();

        let result = decrypt_video(&envelope.ciphertext, &key, &anderer, &KeinFortschritt);
        assert!(matches!(result, Err(CryptoError::Authentifizierung)));
    }

    #[test]
    fn manipuliertes_byte_schlaegt_fehl() {
        let key = generate_key().unwrap();
        let mut envelope =
            encrypt_video(&datei(&[0x55; 4096]), &key, &KeinFortschritt).unwrap();

        envelope.ciphertext[2048] ^= 0x01;

        let result = decrypt_video(&envelope.ciphertext, &key, &envelope.iv, &KeinFortschritt);
        assert!(matches!(result, Err(CryptoError::Authentifizierung)));
    }

    #[test]
    fn abgeschnittener_ciphertext_schlaegt_fehl() {
        let key = generate_key().unwrap();
        let iv = Iv::from_slice(&[0u8; 12]).unwrap();
        let result = decrypt_video(&[1, 2, 3], &key, &iv, &KeinFortschritt);
        assert!(matches!(result, Err(CryptoError::Authentifizierung)));
    }

    #[test]
    fn importierter_schluessel_entschluesselt() {
        let key = generate_key().unwrap();
        let envelope = encrypt_video(&datei(b"export/import"), &key, &KeinFortschritt).unwrap();

        let importiert = import_key(&export_key(&key)).unwrap();
        let decrypted =
            decrypt_video(&envelope.ciphertext, &importiert, &envelope.iv, &KeinFortschritt)
                .unwrap();

        assert_eq!(decrypted, b"export/import");
    }
}
