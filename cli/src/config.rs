//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Client ohne Konfigurationsdatei
//! lauffaehig ist.

use std::path::PathBuf;
use std::time::Duration;

use clipvault_db::DatabaseConfig;
use clipvault_observability::{log_format_gueltig, log_level_gueltig};
use serde::{Deserialize, Serialize};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Lokaler Schluesselspeicher
    pub datenbank: DatenbankEinstellungen,
    /// Video-Server
    pub server: ServerEinstellungen,
    pub logging: LoggingEinstellungen,
    pub metriken: MetrikEinstellungen,
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Modus fuer SQLite
    pub wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://clipvault-keys.db".into(),
            max_verbindungen: 5,
            wal: true,
        }
    }
}

/// Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Basis-URL des Video-Servers
    pub base_url: String,
    /// Timeout pro HTTP-Anfrage in Sekunden
    pub timeout_secs: u64,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            timeout_secs: 300,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

/// Metrik-Export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetrikEinstellungen {
    /// Textfile fuer den Prometheus node_exporter (leer = kein Export)
    pub datei: Option<PathBuf>,
}

impl CliConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.wal,
        }
    }

    pub fn server_timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs.max(1))
    }

    /// Log-Level und -Format nach Kommandozeile und Konfiguration
    ///
    /// `--log-level` und `--json-logs` haben Vorrang. Unbekannte Werte
    /// sind ein Fehler statt stillschweigend `info`/`text`.
    pub fn log_einstellungen<'a>(
        &'a self,
        level: Option<&'a str>,
        json: bool,
    ) -> anyhow::Result<(&'a str, &'a str)> {
        let level = level.unwrap_or(self.logging.level.as_str());
        if !log_level_gueltig(level) {
            anyhow::bail!(
                "Ungueltiges Log-Level '{level}' (erlaubt: trace, debug, info, warn, error)"
            );
        }
        let format = if json { "json" } else { self.logging.format.as_str() };
        if !log_format_gueltig(format) {
            anyhow::bail!("Ungueltiges Log-Format '{format}' (erlaubt: text, json)");
        }
        Ok((level, format))
    }
}
