//! Logging fuer den clipvault-Client via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `CV_LOG_LEVEL`: Log-Level oder Filter-Direktive, Standard: info
//! - `CV_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei.
//! Ausgabe geht nach stderr, damit stdout fuer Kommandoausgaben frei bleibt.

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "CV_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CV_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// Liest `CV_LOG_LEVEL` und `CV_LOG_FORMAT` aus der Umgebung.
/// Faellt auf die uebergebenen Werte und zuletzt auf `info` / `text` zurueck.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_env = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| format.to_string());

    match format_env.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_current_span(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Einfache Log-Level fuer `--log-level` und `[logging] level`
///
/// Filter-Direktiven (`clipvault_pipeline=debug`) sind nur ueber
/// `CV_LOG_LEVEL` moeglich.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// `text` fuer Menschen, `json` fuer die Auswertung der Upload-Laeufe
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
