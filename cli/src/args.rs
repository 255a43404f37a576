//! Kommandozeilen-Argumente

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "clipvault",
    version,
    about = "Videos clientseitig verschluesselt hochladen und abspielen"
)]
pub struct Cli {
    /// Pfad zur Konfigurationsdatei
    #[arg(long, global = true, env = "CLIPVAULT_CONFIG", default_value = "clipvault.toml")]
    pub config: String,

    /// Log-Level (ueberschreibt die Konfiguration)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Logs als JSON nach stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub befehl: Befehl,
}

#[derive(Subcommand, Debug)]
pub enum Befehl {
    /// Prueft Kryptografie und Schluesselspeicher
    Status,

    /// Video bereinigen, verschluesseln und hochladen
    Upload {
        datei: PathBuf,
        #[arg(long, default_value = "")]
        titel: String,
        #[arg(long, default_value = "")]
        beschreibung: String,
        /// MIME-Typ (sonst aus der Dateiendung)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Video herunterladen, entschluesseln und speichern
    Play {
        video_id: String,
        #[arg(long)]
        ausgabe: PathBuf,
    },

    /// Video auf dem Server und den lokalen Schluessel loeschen
    Delete { video_id: String },

    /// Nur Metadaten entfernen (ohne Verschluesselung)
    Strip {
        datei: PathBuf,
        #[arg(long)]
        ausgabe: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },

    /// Metadaten einer Datei auflisten
    Analyse {
        datei: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },

    /// Lokale Schluessel verwalten
    Keys {
        #[command(subcommand)]
        befehl: KeysBefehl,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeysBefehl {
    /// Alle Video-IDs mit gespeichertem Schluessel
    List,

    /// Backup aller Schluessel (enthaelt Schluesselmaterial!)
    Export {
        #[arg(long)]
        ausgabe: Option<PathBuf>,
    },

    /// Backup einlesen
    Import { datei: PathBuf },

    /// Einzelnen Schluessel loeschen
    Delete { video_id: String },

    /// Alle Schluessel unwiderruflich loeschen
    Clear {
        /// Loeschen bestaetigen
        #[arg(long)]
        ja: bool,
    },
}
