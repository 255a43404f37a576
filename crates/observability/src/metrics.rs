//! Prometheus-kompatible Metriken fuer clipvault
//!
//! Registrierte Metriken:
//! - `clipvault_uploads_total` – Counter: Uploads (ergebnis)
//! - `clipvault_playbacks_total` – Counter: Wiedergaben (ergebnis)
//! - `clipvault_encrypted_bytes_total` – Counter: Verschluesselte Bytes
//! - `clipvault_decrypted_bytes_total` – Counter: Entschluesselte Bytes
//! - `clipvault_metadata_removed_bytes_total` – Counter: Entfernte Metadaten-Bytes
//! - `clipvault_errors_total` – Counter: Fehler (art)
//! - `clipvault_stage_duration_seconds` – Histogram: Dauer je Pipeline-Stufe

use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::path::Path;
use std::sync::Arc;

/// Alle clipvault-Prometheus-Metriken
#[derive(Clone)]
pub struct VaultMetrics {
    pub registry: Arc<Registry>,

    pub uploads_total: IntCounterVec,
    pub playbacks_total: IntCounterVec,
    pub encrypted_bytes_total: IntCounter,
    pub decrypted_bytes_total: IntCounter,
    pub metadata_removed_bytes_total: IntCounter,
    pub errors_total: IntCounterVec,
    pub stage_duration_seconds: HistogramVec,
}

impl VaultMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let uploads_total = IntCounterVec::new(
            Opts::new("clipvault_uploads_total", "Gesamtanzahl Upload-Versuche"),
            &["ergebnis"],
        )?;
        registry.register(Box::new(uploads_total.clone()))?;

        let playbacks_total = IntCounterVec::new(
            Opts::new("clipvault_playbacks_total", "Gesamtanzahl Wiedergabe-Versuche"),
            &["ergebnis"],
        )?;
        registry.register(Box::new(playbacks_total.clone()))?;

        let encrypted_bytes_total = IntCounter::with_opts(Opts::new(
            "clipvault_encrypted_bytes_total",
            "Summe verschluesselter Klartext-Bytes",
        ))?;
        registry.register(Box::new(encrypted_bytes_total.clone()))?;

        let decrypted_bytes_total = IntCounter::with_opts(Opts::new(
            "clipvault_decrypted_bytes_total",
            "Summe entschluesselter Bytes",
        ))?;
        registry.register(Box::new(decrypted_bytes_total.clone()))?;

        let metadata_removed_bytes_total = IntCounter::with_opts(Opts::new(
            "clipvault_metadata_removed_bytes_total",
            "Summe entfernter Metadaten-Bytes",
        ))?;
        registry.register(Box::new(metadata_removed_bytes_total.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new("clipvault_errors_total", "Fehler nach Art"),
            &["art"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        let stage_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "clipvault_stage_duration_seconds",
                "Dauer einer Pipeline-Stufe in Sekunden",
            )
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["stufe"],
        )?;
        registry.register(Box::new(stage_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            uploads_total,
            playbacks_total,
            encrypted_bytes_total,
            decrypted_bytes_total,
            metadata_removed_bytes_total,
            errors_total,
            stage_duration_seconds,
        })
    }

    /// Erfolgreichen oder fehlgeschlagenen Upload zaehlen
    pub fn upload_zaehlen(&self, erfolg: bool) {
        self.uploads_total
            .with_label_values(&[ergebnis_label(erfolg)])
            .inc();
    }

    /// Erfolgreiche oder fehlgeschlagene Wiedergabe zaehlen
    pub fn wiedergabe_zaehlen(&self, erfolg: bool) {
        self.playbacks_total
            .with_label_values(&[ergebnis_label(erfolg)])
            .inc();
    }

    pub fn fehler_zaehlen(&self, art: &str) {
        self.errors_total.with_label_values(&[art]).inc();
    }

    pub fn stufe_beobachten(&self, stufe: &str, sekunden: f64) {
        self.stage_duration_seconds
            .with_label_values(&[stufe])
            .observe(sekunden);
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Schreibt den Export atomar in eine Datei (Textfile-Collector)
    pub fn in_datei_schreiben(&self, pfad: &Path) -> Result<()> {
        let text = self.exportieren()?;
        let tmp = pfad.with_extension("prom.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, pfad)?;
        tracing::debug!(pfad = %pfad.display(), "Metriken geschrieben");
        Ok(())
    }
}

fn ergebnis_label(erfolg: bool) -> &'static str {
    if erfolg {
        "erfolg"
    } else {
        "fehler"
    }
}
