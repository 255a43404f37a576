//! clipvault-cli – Bibliotheks-Root
//!
//! Der Kommandozeilen-Client uebernimmt die Rolle des Upload-Panels und
//! des Players: Videos werden lokal bereinigt und verschluesselt, nur
//! Ciphertext geht an den Server.

pub mod args;
pub mod befehle;
pub mod config;

pub use args::{Befehl, Cli, KeysBefehl};
pub use befehle::Sitzung;
pub use config::CliConfig;
