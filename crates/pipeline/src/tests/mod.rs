//! Service-Tests mit In-Memory-Datenbank und Fake-Server

mod key_manager_tests;
mod playback_tests;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use clipvault_core::{Fortschritt, FortschrittsBeobachter, VideoId};
use clipvault_db::{DbError, DbResult, KeyRecord, KeyRepository, SqliteDb};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::backend::{UploadAnfrage, VideoBackend};
use crate::error::{VaultError, VaultResult};
use crate::key_manager::KeyManager;

pub(crate) async fn test_db() -> Arc<SqliteDb> {
    Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory-DB konnte nicht geoeffnet werden"),
    )
}

pub(crate) async fn test_key_manager() -> KeyManager<SqliteDb> {
    KeyManager::neu(test_db().await)
}

/// Server im Speicher; vergibt die IDs v1, v2, ...
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub videos: Mutex<HashMap<VideoId, Vec<u8>>>,
    pub anfragen: Mutex<Vec<UploadAnfrage>>,
    pub geloescht: Mutex<Vec<VideoId>>,
    naechste_id: AtomicU64,
    pub upload_fehler: AtomicBool,
    pub fetch_fehler: AtomicBool,
    pub loesch_fehler: AtomicBool,
    /// Upload wartet auf `freigabe`, solange gesetzt
    pub anhalten: AtomicBool,
    pub freigabe: Notify,
}

impl FakeBackend {
    pub fn neu() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Veraendert ein Byte des gespeicherten Ciphertexts
    pub fn manipulieren(&self, video_id: &VideoId, index: usize) {
        let mut videos = self.videos.lock();
        let daten = videos.get_mut(video_id).expect("Video nicht vorhanden");
        daten[index] ^= 0x01;
    }

    /// Ersetzt den gespeicherten Ciphertext
    pub fn ersetzen(&self, video_id: &VideoId, daten: Vec<u8>) {
        self.videos.lock().insert(video_id.clone(), daten);
    }
}

impl VideoBackend for FakeBackend {
    async fn upload(&self, anfrage: UploadAnfrage) -> VaultResult<VideoId> {
        if self.anhalten.load(Ordering::SeqCst) {
            self.freigabe.notified().await;
        }
        if self.upload_fehler.load(Ordering::SeqCst) {
            return Err(VaultError::netzwerk("Verbindung abgebrochen"));
        }
        let nr = self.naechste_id.fetch_add(1, Ordering::SeqCst) + 1;
        let video_id = VideoId::new(format!("v{nr}"));
        self.videos
            .lock()
            .insert(video_id.clone(), anfrage.ciphertext.clone());
        self.anfragen.lock().push(anfrage);
        Ok(video_id)
    }

    async fn fetch_encrypted(&self, video_id: &VideoId) -> VaultResult<Vec<u8>> {
        if self.fetch_fehler.load(Ordering::SeqCst) {
            return Err(VaultError::netzwerk("Zeitueberschreitung"));
        }
        self.videos
            .lock()
            .get(video_id)
            .cloned()
            .ok_or_else(|| VaultError::netzwerk(format!("404 fuer {video_id}")))
    }

    async fn delete(&self, video_id: &VideoId) -> VaultResult<()> {
        if self.loesch_fehler.load(Ordering::SeqCst) {
            return Err(VaultError::netzwerk("Server nicht erreichbar"));
        }
        self.videos.lock().remove(video_id);
        self.geloescht.lock().push(video_id.clone());
        Ok(())
    }
}

/// Schluesselspeicher, der jeden Schreibversuch ablehnt
pub(crate) struct VollerSpeicher;

impl KeyRepository for VollerSpeicher {
    async fn upsert(&self, _record: &KeyRecord) -> DbResult<()> {
        Err(DbError::intern("Speicher voll"))
    }
    async fn get(&self, _video_id: &VideoId) -> DbResult<Option<KeyRecord>> {
        Ok(None)
    }
    async fn delete(&self, _video_id: &VideoId) -> DbResult<bool> {
        Ok(false)
    }
    async fn list_ids(&self) -> DbResult<Vec<VideoId>> {
        Ok(Vec::new())
    }
    async fn list_all(&self) -> DbResult<Vec<KeyRecord>> {
        Ok(Vec::new())
    }
    async fn upsert_many(&self, _records: &[KeyRecord]) -> DbResult<usize> {
        Err(DbError::intern("Speicher voll"))
    }
    async fn clear(&self) -> DbResult<u64> {
        Ok(0)
    }
    async fn count(&self) -> DbResult<u64> {
        Ok(0)
    }
}

/// Sammelt alle Fortschritts-Ereignisse
pub(crate) fn sammler() -> (impl FortschrittsBeobachter, Arc<Mutex<Vec<Fortschritt>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log2 = Arc::clone(&log);
    let beobachter = move |f: &Fortschritt| log2.lock().push(f.clone());
    (beobachter, log)
}

/// Baut eine ISO-BMFF-Box
pub(crate) fn mp4_box(typ: &[u8; 4], inhalt: &[u8]) -> Vec<u8> {
    let mut b = ((inhalt.len() + 8) as u32).to_be_bytes().to_vec();
    b.extend_from_slice(typ);
    b.extend_from_slice(inhalt);
    b
}

/// MP4 mit Standort und Autor in `moov/udta`
pub(crate) fn mp4_mit_metadaten() -> Vec<u8> {
    let udta = mp4_box(
        b"udta",
        &[
            mp4_box(b"loci", b"52.5200N 13.4050E Berlin"),
            mp4_box(b"auth", b"Erika Mustermann"),
        ]
        .concat(),
    );
    [
        mp4_box(b"ftyp", b"isom\0\0\x02\0"),
        mp4_box(b"moov", &[mp4_box(b"mvhd", &[0; 12]), udta].concat()),
        mp4_box(b"mdat", &[0xAB; 256]),
    ]
    .concat()
}

/// Deterministischer Testpuffer
pub(crate) fn testdaten(laenge: usize) -> Vec<u8> {
    (0..laenge).map(|i| (i % 251) as u8).collect()
}
