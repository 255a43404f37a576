//! clipvault-db – Lokaler Schluesselspeicher
//!
//! Dieses Crate persistiert die Video-Schluessel (`KeyRecord`) in einer
//! lokalen SQLite-Datenbank, eine Tabelle mit der Video-ID als
//! Primaerschluessel. Es kennt keine Kryptografie: Schluessel und IV
//! liegen hier bereits als Base64-Text vor.
//!
//! Geht ein Datensatz verloren, ist das zugehoerige Video dauerhaft nicht
//! mehr entschluesselbar. Der Server haelt keine Kopie der Schluessel.

pub mod backup;
pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use backup::{KeyBackup, BACKUP_VERSION};
pub use error::DbError;
pub use models::KeyRecord;
pub use repository::{DatabaseConfig, DbResult, KeyRepository};
pub use sqlite::SqliteDb;
