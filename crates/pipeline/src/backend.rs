//! Server-Anbindung fuer Ciphertext-Upload und -Download
//!
//! Der Server sieht ausschliesslich Ciphertext, einen anonymen
//! Dateinamen und die Verschluesselungs-Metadaten.

use std::time::Duration;

use clipvault_core::VideoId;
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};

use crate::error::{VaultError, VaultResult};

/// Alles was fuer einen Upload an den Server geht
#[derive(Clone)]
pub struct UploadAnfrage {
    /// Anonymer Dateiname (`encrypted_<ms>_<zufall>.enc`)
    pub dateiname: String,
    pub ciphertext: Vec<u8>,
    /// JSON der Verschluesselungs-Metadaten
    pub metadata: String,
    pub titel: String,
    pub beschreibung: String,
}

impl std::fmt::Debug for UploadAnfrage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadAnfrage")
            .field("dateiname", &self.dateiname)
            .field("ciphertext_len", &self.ciphertext.len())
            .field("titel", &self.titel)
            .finish_non_exhaustive()
    }
}

/// Abstrakter Video-Server
#[allow(async_fn_in_trait)]
pub trait VideoBackend: Send + Sync {
    /// Laedt Ciphertext hoch, gibt die vom Server vergebene ID zurueck
    async fn upload(&self, anfrage: UploadAnfrage) -> VaultResult<VideoId>;

    /// Laedt den Ciphertext eines Videos
    async fn fetch_encrypted(&self, video_id: &VideoId) -> VaultResult<Vec<u8>>;

    /// Loescht ein Video; ein bereits geloeschtes Video ist kein Fehler
    async fn delete(&self, video_id: &VideoId) -> VaultResult<()>;
}

/// HTTP-Backend (reqwest)
#[derive(Debug, Clone)]
pub struct HttpVideoBackend {
    client: reqwest::Client,
    basis: Url,
}

impl HttpVideoBackend {
    pub fn neu(base_url: &str, timeout: Duration) -> VaultResult<Self> {
        let basis = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| VaultError::format(format!("Ungueltige Server-URL '{base_url}': {e}")))?;
        if basis.cannot_be_a_base() {
            return Err(VaultError::format(format!(
                "Server-URL '{base_url}' kann keine Pfade enthalten"
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, basis })
    }

    pub fn basis(&self) -> &Url {
        &self.basis
    }

    /// Haengt Pfadsegmente an die Basis-URL (Segmente werden kodiert)
    fn url(&self, segmente: &[&str]) -> VaultResult<Url> {
        let mut url = self.basis.clone();
        url.path_segments_mut()
            .map_err(|_| VaultError::format("Server-URL kann keine Pfade enthalten"))?
            .pop_if_empty()
            .extend(segmente);
        Ok(url)
    }
}

impl VideoBackend for HttpVideoBackend {
    async fn upload(&self, anfrage: UploadAnfrage) -> VaultResult<VideoId> {
        let url = self.url(&["api", "upload"])?;
        let groesse = anfrage.ciphertext.len();

        let video_part = Part::bytes(anfrage.ciphertext)
            .file_name(anfrage.dateiname.clone())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("video", video_part)
            .text("encrypted", "true")
            .text("metadata", anfrage.metadata)
            .text("title", anfrage.titel)
            .text("description", anfrage.beschreibung);

        let resp = self.client.post(url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(VaultError::netzwerk(format!(
                "Upload fehlgeschlagen: {status} {text}"
            )));
        }

        let antwort: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| VaultError::netzwerk(format!("Upload-Antwort unlesbar: {e}")))?;
        let video_id = video_id_aus_antwort(&antwort).ok_or_else(|| {
            VaultError::netzwerk("Upload-Antwort enthaelt keine Video-ID")
        })?;

        tracing::info!(
            video_id = %video_id,
            dateiname = %anfrage.dateiname,
            bytes = groesse,
            "Ciphertext hochgeladen"
        );
        Ok(video_id)
    }

    async fn fetch_encrypted(&self, video_id: &VideoId) -> VaultResult<Vec<u8>> {
        let mut url = self.url(&["api", "video", video_id.as_str()])?;
        url.query_pairs_mut().append_pair("encrypted", "true");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(VaultError::netzwerk(format!(
                "Download von Video '{video_id}' fehlgeschlagen: {status}"
            )));
        }

        let ist_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if !ist_json {
            let bytes = resp.bytes().await?;
            tracing::debug!(video_id = %video_id, bytes = bytes.len(), "Ciphertext geladen");
            return Ok(bytes.to_vec());
        }

        // Server liefert nur einen Verweis auf die eigentliche Datei
        let verweis: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| VaultError::netzwerk(format!("Download-Antwort unlesbar: {e}")))?;
        let ziel = verweis
            .get("url")
            .and_then(|u| u.as_str())
            .ok_or_else(|| VaultError::netzwerk("Download-Antwort enthaelt keine URL"))?;
        let ziel = self
            .basis
            .join(ziel)
            .map_err(|e| VaultError::netzwerk(format!("Ungueltige Download-URL '{ziel}': {e}")))?;

        let resp = self.client.get(ziel).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(VaultError::netzwerk(format!(
                "Download von Video '{video_id}' fehlgeschlagen: {status}"
            )));
        }
        let bytes = resp.bytes().await?;
        tracing::debug!(video_id = %video_id, bytes = bytes.len(), "Ciphertext ueber Verweis geladen");
        Ok(bytes.to_vec())
    }

    async fn delete(&self, video_id: &VideoId) -> VaultResult<()> {
        let url = self.url(&["api", "video", video_id.as_str()])?;
        let resp = self.client.delete(url).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(video_id = %video_id, "Video auf dem Server bereits geloescht");
            return Ok(());
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(VaultError::netzwerk(format!(
                "Loeschen von Video '{video_id}' fehlgeschlagen: {status} {text}"
            )));
        }

        tracing::info!(video_id = %video_id, "Video auf dem Server geloescht");
        Ok(())
    }
}

/// `video_id` oder `id`, als String oder Zahl
fn video_id_aus_antwort(antwort: &serde_json::Value) -> Option<VideoId> {
    let wert = antwort.get("video_id").or_else(|| antwort.get("id"))?;
    let id = match wert {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let id = VideoId::new(id);
    id.ist_gueltig().then_some(id)
}
