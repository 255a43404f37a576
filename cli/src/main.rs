//! clipvault – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und fuehrt den
//! gewaehlten Befehl aus.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use clipvault_cli::{Cli, CliConfig, Sitzung};
use clipvault_observability::logging_initialisieren;

#[tokio::main]
async fn main() -> ExitCode {
    match ausfuehren(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fehler: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn ausfuehren(cli: Cli) -> Result<()> {
    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = CliConfig::laden(&cli.config)?;

    let (level, format) = config.log_einstellungen(cli.log_level.as_deref(), cli.json_logs)?;
    logging_initialisieren(level, format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config,
        "clipvault gestartet"
    );

    let sitzung = Sitzung::neu(config)?;
    let ergebnis = sitzung.ausfuehren(cli.befehl).await;

    if let Some(pfad) = &sitzung.config.metriken.datei {
        if let Err(e) = sitzung.metriken.in_datei_schreiben(pfad) {
            tracing::warn!(fehler = %e, pfad = %pfad.display(), "Metriken konnten nicht geschrieben werden");
        }
    }
    sitzung.ctx.schliessen().await;

    ergebnis
}
