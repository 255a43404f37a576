//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Algorithmus-Bezeichnung wie sie in den Metadaten landet
pub const ALGORITHMUS: &str = "AES-GCM";
/// Schluessel-Laenge in Bit
pub const KEY_LAENGE_BITS: u32 = 256;
/// IV-Laenge in Bytes (96 Bit fuer GCM)
pub const IV_LAENGE: usize = 12;
/// Laenge des Auth-Tags in Bit
pub const TAG_LAENGE_BITS: u32 = 128;

pub(crate) const KEY_LAENGE: usize = (KEY_LAENGE_BITS / 8) as usize;

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(pub Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Symmetrischer Video-Schluessel (AES-256, exportierbar)
///
/// Wird nie an den Server uebertragen.
#[derive(Debug, Clone)]
pub struct VideoKey {
    pub(crate) bytes: SecretBytes,
}

impl VideoKey {
    pub(crate) fn aus_bytes(bytes: Vec<u8>) -> CryptoResult<Self> {
        if bytes.len() != KEY_LAENGE {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: KEY_LAENGE,
                erhalten: bytes.len(),
            });
        }
        Ok(Self {
            bytes: SecretBytes::new(bytes),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }
}

/// Initialisierungsvektor (96 Bit)
///
/// Fuer die Verschluesselung wird der IV ausschliesslich intern erzeugt,
/// ein IV darf mit demselben Schluessel nie zweimal verwendet werden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv {
    bytes: [u8; IV_LAENGE],
}

impl Iv {
    /// Frischer Zufalls-IV aus dem Betriebssystem-RNG
    pub(crate) fn generate() -> CryptoResult<Self> {
        let mut bytes = [0u8; IV_LAENGE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::PlattformNichtUnterstuetzt(e.to_string()))?;
        Ok(Self { bytes })
    }

    /// IV aus gespeicherten Bytes (nur fuer Entschluesselung/Wiederherstellung)
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; IV_LAENGE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::UngueltigeIvLaenge {
                    erwartet: IV_LAENGE,
                    erhalten: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; IV_LAENGE] {
        &self.bytes
    }
}

/// Metadaten einer Verschluesselung
///
/// Werden zusammen mit Schluessel und IV lokal gespeichert und als JSON
/// an den Upload angehaengt. Feldnamen im camelCase-Format der
/// Browser-Backups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionMetadata {
    pub original_name: String,
    pub original_size: u64,
    pub original_type: String,
    pub encrypted_size: u64,
    /// Unix-Zeit in Millisekunden
    pub timestamp: i64,
    pub algorithm: String,
    pub key_length: u32,
    /// SHA-256 des Ciphertexts (hex), fehlt bei aelteren Backups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphertext_sha256: Option<String>,
}

/// Ergebnis einer Verschluesselung (nur im Speicher)
///
/// Die drei Felder werden getrennt weitergegeben: Ciphertext an den
/// Server, IV und Metadaten an den lokalen Schluesselspeicher.
#[derive(Clone)]
pub struct EncryptionEnvelope {
    /// Ciphertext inkl. 16 Bytes Auth-Tag (angehaengt)
    pub ciphertext: Vec<u8>,
    pub iv: Iv,
    pub metadata: EncryptionMetadata,
}

impl std::fmt::Debug for EncryptionEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionEnvelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
