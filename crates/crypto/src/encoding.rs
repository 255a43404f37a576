//! Umwandlung zwischen Binaerdaten und Text
//!
//! Der Schluesselspeicher und JSON-Transporte koennen keine rohen Bytes
//! tragen. Base64 im Standard-Alphabet mit Padding, kompatibel zu
//! `btoa`/`atob` im Browser.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use crate::error::CryptoResult;

/// Bytes -> Base64
pub fn bytes_zu_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Base64 -> Bytes
pub fn base64_zu_bytes(text: &str) -> CryptoResult<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}

/// SHA-256 als Hex-String
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_bekannter_wert() {
        assert_eq!(bytes_zu_base64(b"clip"), "Y2xpcA==");
        assert_eq!(base64_zu_bytes("Y2xpcA==").unwrap(), b"clip");
    }

    #[test]
    fn base64_mit_whitespace() {
        assert_eq!(base64_zu_bytes("  Y2xpcA==\n").unwrap(), b"clip");
    }

    #[test]
    fn ungueltiges_base64() {
        assert!(base64_zu_bytes("nicht base64!").is_err());
    }

    #[test]
    fn sha256_leer() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
