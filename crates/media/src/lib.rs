//! clipvault-media – Metadaten aus Video-Containern entfernen
//!
//! Bevor ein Video verschluesselt das Geraet verlaesst, werden
//! identifizierende Metadaten (Autor, Titel, GPS-Position, ...) entfernt,
//! ohne Bild- und Tondaten zu veraendern.
//!
//! # Module
//! - `reader`    – Bounds-gepruefter Byte-Cursor
//! - `mp4`       – ISO-BMFF Box-Walker, `moov`-Neuaufbau
//! - `container` – Formaterkennung (MIME-Typ, Magic Bytes)
//! - `stripper`  – `strip_metadata` fuer alle Formate
//! - `analyse`   – Metadaten-Bericht ohne Veraenderung
//! - `filename`  – Anonyme Dateinamen

pub mod analyse;
pub mod container;
pub mod error;
pub mod filename;
pub mod mp4;
pub mod reader;
pub mod report;
pub mod stripper;

pub use analyse::{analysieren, MetadataAnalyse};
pub use container::Container;
pub use error::{MediaError, MediaResult};
pub use filename::{create_anonymous_filename, create_encrypted_filename};
pub use report::{EntfernteBox, Methode, StrippingReport};
pub use stripper::{strip_metadata, BereinigteDatei};
