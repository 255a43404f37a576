//! # clipvault-observability
//!
//! Observability-Crate fuer clipvault:
//! - Structured Logging via tracing-subscriber (Text oder JSON)
//! - Prometheus-kompatible Metriken der Upload- und Wiedergabe-Pipeline,
//!   exportiert im Textformat (z.B. fuer den node-exporter Textfile-Collector)

pub mod logging;
pub mod metrics;

pub use logging::{log_format_gueltig, log_level_gueltig, logging_initialisieren};
pub use metrics::VaultMetrics;
