//! Video-Verschluesselung (Ende-zu-Ende)
//!
//! Der Browser bzw. Client verschluesselt das Video bevor es das Geraet
//! verlaesst. Der Server speichert nur Ciphertext.
//!
//! ## Ablauf
//! 1. `generate_key` erzeugt pro Video einen AES-256-Schluessel
//! 2. `encrypt_video` erzeugt einen frischen IV und verschluesselt in einem Stueck
//! 3. Schluessel + IV werden lokal gespeichert (`export_key`)
//! 4. `decrypt_video` prueft den Auth-Tag und liefert den Klartext

pub mod decrypt;
pub mod encrypt;
pub mod key;

pub use decrypt::decrypt_video;
pub use encrypt::encrypt_video;
pub use key::{export_key, generate_key, import_key, plattform_pruefen};
