//! Blob-URLs fuer entschluesselte Videos
//!
//! Entschluesselte Bytes liegen nur im Speicher und werden ueber eine
//! opake URL referenziert. Wird die URL widerrufen, gibt die Registry
//! ihren Anteil an den Daten frei.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clipvault_core::VideoId;
use dashmap::DashMap;
use uuid::Uuid;

const URL_PRAEFIX: &str = "blob:clipvault/";

/// Klartext-Video im Speicher
#[derive(Clone)]
pub struct VideoBlob {
    pub daten: Arc<Vec<u8>>,
    pub mime_type: String,
}

impl std::fmt::Debug for VideoBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoBlob")
            .field("groesse", &self.daten.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Registry aller aktiven Blob-URLs
#[derive(Debug, Default)]
pub struct BlobRegistry {
    blobs: DashMap<String, VideoBlob>,
}

impl BlobRegistry {
    pub fn neu() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Legt Bytes unter einer neuen URL ab
    pub fn create_video_url(&self, daten: Vec<u8>, mime_type: &str) -> String {
        let url = format!("{URL_PRAEFIX}{}", Uuid::new_v4());
        tracing::debug!(url = %url, bytes = daten.len(), mime = mime_type, "Blob-URL erstellt");
        self.blobs.insert(
            url.clone(),
            VideoBlob {
                daten: Arc::new(daten),
                mime_type: mime_type.to_string(),
            },
        );
        url
    }

    pub fn get(&self, url: &str) -> Option<VideoBlob> {
        self.blobs.get(url).map(|b| b.value().clone())
    }

    /// Gibt die URL frei; `false` wenn sie unbekannt war
    pub fn revoke_video_url(&self, url: &str) -> bool {
        let entfernt = self.blobs.remove(url).is_some();
        if entfernt {
            tracing::debug!(url = %url, "Blob-URL widerrufen");
        }
        entfernt
    }

    /// Anzahl nicht widerrufener URLs
    pub fn aktive(&self) -> usize {
        self.blobs.len()
    }
}

/// Handle auf ein abspielbares Video
///
/// Die Blob-URL wird beim `schliessen()` oder spaetestens beim Drop
/// widerrufen.
pub struct Wiedergabe {
    url: String,
    video_id: VideoId,
    registry: Arc<BlobRegistry>,
    widerrufen: AtomicBool,
}

impl Wiedergabe {
    pub(crate) fn neu(url: String, video_id: VideoId, registry: Arc<BlobRegistry>) -> Self {
        Self {
            url,
            video_id,
            registry,
            widerrufen: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    /// Entschluesselte Daten, solange die URL aktiv ist
    pub fn blob(&self) -> Option<VideoBlob> {
        self.registry.get(&self.url)
    }

    pub fn schliessen(&self) {
        if !self.widerrufen.swap(true, Ordering::SeqCst) {
            self.registry.revoke_video_url(&self.url);
        }
    }
}

impl Drop for Wiedergabe {
    fn drop(&mut self) {
        self.schliessen();
    }
}

impl std::fmt::Debug for Wiedergabe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wiedergabe")
            .field("url", &self.url)
            .field("video_id", &self.video_id)
            .finish_non_exhaustive()
    }
}
