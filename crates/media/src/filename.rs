//! Anonyme Dateinamen
//!
//! Der urspruengliche Dateiname verlaesst das Geraet nie. Erhalten bleibt
//! nur die (bereinigte) Endung.

const MAX_ENDUNG: usize = 8;

/// `video_<ms>_<8 Zufallszeichen>.<endung>`
pub fn create_anonymous_filename(original: &str) -> String {
    format!(
        "video_{}_{}.{}",
        chrono::Utc::now().timestamp_millis(),
        zufalls_suffix(),
        endung(original)
    )
}

/// Name fuer den hochgeladenen Ciphertext: `encrypted_<ms>_<8 Zufallszeichen>.enc`
pub fn create_encrypted_filename() -> String {
    format!(
        "encrypted_{}_{}.enc",
        chrono::Utc::now().timestamp_millis(),
        zufalls_suffix()
    )
}

fn zufalls_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn endung(original: &str) -> String {
    let endung: String = original
        .rsplit_once('.')
        .map(|(_, e)| e)
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_ENDUNG)
        .collect::<String>()
        .to_ascii_lowercase();

    if endung.is_empty() {
        "bin".into()
    } else {
        endung
    }
}
