//! Unit-Tests fuer den PlaybackOrchestrator

use std::sync::atomic::Ordering;

use clipvault_core::{KeinFortschritt, Stufe, VideoDatei, VideoId};
use clipvault_observability::VaultMetrics;

use super::{mp4_mit_metadaten, sammler, test_key_manager, testdaten, FakeBackend};
use crate::blob::BlobRegistry;
use crate::error::VaultError;
use crate::playback::PlaybackOrchestrator;
use crate::upload::{UploadOptionen, UploadOrchestrator};

#[tokio::test]
async fn test_ein_megabyte_hoch_und_wieder_abspielen() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    let original = testdaten(1024 * 1024);

    let video_id = {
        let upload = UploadOrchestrator::neu(km.clone(), backend.clone());
        upload
            .hochladen(
                &VideoDatei::neu("gross.bin", "application/octet-stream", original.clone()),
                UploadOptionen::default(),
                &KeinFortschritt,
            )
            .await
            .unwrap()
            .video_id
    };
    assert_eq!(video_id, VideoId::from("v1"));

    let playback = PlaybackOrchestrator::neu(km, backend, BlobRegistry::neu());
    let wiedergabe = playback.abspielen(&video_id, &KeinFortschritt).await.unwrap();

    let blob = wiedergabe.blob().unwrap();
    assert_eq!(*blob.daten, original);
    assert_eq!(blob.mime_type, "application/octet-stream");
    assert_eq!(wiedergabe.video_id(), &video_id);
}

#[tokio::test]
async fn test_wiedergabe_ohne_metadaten_und_mime_aus_metadaten() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    let upload = UploadOrchestrator::neu(km.clone(), backend.clone());
    let ergebnis = upload
        .hochladen(
            &VideoDatei::neu("a.mp4", "video/mp4", mp4_mit_metadaten()),
            UploadOptionen::default(),
            &KeinFortschritt,
        )
        .await
        .unwrap();

    let playback = PlaybackOrchestrator::neu(km, backend, BlobRegistry::neu());
    let (beobachter, log) = sammler();
    let wiedergabe = playback
        .abspielen(&ergebnis.video_id, &beobachter)
        .await
        .unwrap();

    let blob = wiedergabe.blob().unwrap();
    assert_eq!(blob.mime_type, "video/mp4");
    assert_eq!(blob.daten.len() as u64, ergebnis.report.cleaned_size);
    assert!(!blob.daten.windows(4).any(|w| w == b"loci"));

    let log = log.lock();
    let werte: Vec<u8> = log.iter().map(|f| f.prozent).collect();
    assert!(werte.windows(2).all(|w| w[0] <= w[1]), "{werte:?}");
    assert_eq!(log.first().unwrap().stufe, Stufe::SchluesselLaden);
    assert_eq!(werte.last(), Some(&100));
}

#[tokio::test]
async fn test_fehlender_schluessel_laedt_nichts_herunter() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    backend.ersetzen(&VideoId::from("fremd"), vec![1, 2, 3]);
    backend.fetch_fehler.store(true, Ordering::SeqCst);

    let playback = PlaybackOrchestrator::neu(km, backend, BlobRegistry::neu());
    let err = playback
        .abspielen(&VideoId::from("fremd"), &KeinFortschritt)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::SchluesselNichtGefunden { .. }));
}

#[tokio::test]
async fn test_veraenderter_ciphertext_ohne_pruefsumme_ist_authentifizierungsfehler() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    let upload = UploadOrchestrator::neu(km.clone(), backend.clone());
    let video_id = upload
        .hochladen(
            &VideoDatei::neu("a.bin", "application/octet-stream", testdaten(2048)),
            UploadOptionen::default(),
            &KeinFortschritt,
        )
        .await
        .unwrap()
        .video_id;

    // Aelteres Backup ohne Pruefsumme: nur das Auth-Tag schuetzt
    let gespeichert = km.retrieve_key(&video_id).await.unwrap();
    let mut metadata = gespeichert.metadata.clone();
    metadata
        .as_object_mut()
        .unwrap()
        .remove("ciphertextSha256");
    km.store_key(&video_id, &gespeichert.key, &gespeichert.iv, &metadata)
        .await
        .unwrap();

    backend.manipulieren(&video_id, 100);

    let blobs = BlobRegistry::neu();
    let metriken = VaultMetrics::neu().unwrap();
    let playback = PlaybackOrchestrator::neu(km, backend, blobs.clone())
        .mit_metriken(metriken.clone());
    let err = playback
        .abspielen(&video_id, &KeinFortschritt)
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::AuthentifizierungFehlgeschlagen));
    assert!(!err.ist_wiederholbar());
    assert_eq!(blobs.aktive(), 0);
    assert_eq!(
        metriken
            .errors_total
            .with_label_values(&["authentifizierung"])
            .get(),
        1
    );
}

#[tokio::test]
async fn test_pruefsumme_meldet_veraenderung_als_authentifizierungsfehler() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    let upload = UploadOrchestrator::neu(km.clone(), backend.clone());
    let video_id = upload
        .hochladen(
            &VideoDatei::neu("a.bin", "application/octet-stream", testdaten(512)),
            UploadOptionen::default(),
            &KeinFortschritt,
        )
        .await
        .unwrap()
        .video_id;

    backend.manipulieren(&video_id, 0);

    let playback = PlaybackOrchestrator::neu(km, backend, BlobRegistry::neu());
    let err = playback
        .abspielen(&video_id, &KeinFortschritt)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::AuthentifizierungFehlgeschlagen));
    assert!(!err.ist_wiederholbar());
}

#[tokio::test]
async fn test_veraenderter_ciphertext_bleibt_bei_wiederholung_authentifizierungsfehler() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    let upload = UploadOrchestrator::neu(km.clone(), backend.clone());
    let video_id = upload
        .hochladen(
            &VideoDatei::neu("a.bin", "application/octet-stream", testdaten(4096)),
            UploadOptionen::default(),
            &KeinFortschritt,
        )
        .await
        .unwrap()
        .video_id;

    backend.manipulieren(&video_id, 100);

    let metriken = VaultMetrics::neu().unwrap();
    let playback = PlaybackOrchestrator::neu(km, backend, BlobRegistry::neu())
        .mit_metriken(metriken.clone());
    for _ in 0..3 {
        let err = playback
            .abspielen(&video_id, &KeinFortschritt)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::AuthentifizierungFehlgeschlagen));
        assert!(!err.ist_wiederholbar());
    }
    assert_eq!(
        metriken.errors_total.with_label_values(&["netzwerk"]).get(),
        0
    );
    assert_eq!(
        metriken
            .errors_total
            .with_label_values(&["authentifizierung"])
            .get(),
        3
    );
}

#[tokio::test]
async fn test_blob_url_wird_beim_drop_widerrufen() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    let upload = UploadOrchestrator::neu(km.clone(), backend.clone());
    let video_id = upload
        .hochladen(
            &VideoDatei::neu("a.bin", "application/octet-stream", testdaten(64)),
            UploadOptionen::default(),
            &KeinFortschritt,
        )
        .await
        .unwrap()
        .video_id;

    let blobs = BlobRegistry::neu();
    let playback = PlaybackOrchestrator::neu(km, backend, blobs.clone());

    let wiedergabe = playback.abspielen(&video_id, &KeinFortschritt).await.unwrap();
    let url = wiedergabe.url().to_string();
    assert!(blobs.get(&url).is_some());

    drop(wiedergabe);
    assert!(blobs.get(&url).is_none());
    assert_eq!(playback.blobs().aktive(), 0);
}

#[tokio::test]
async fn test_loeschen_entfernt_video_und_schluessel() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    let upload = UploadOrchestrator::neu(km.clone(), backend.clone());
    let video_id = upload
        .hochladen(
            &VideoDatei::neu("a.bin", "application/octet-stream", testdaten(64)),
            UploadOptionen::default(),
            &KeinFortschritt,
        )
        .await
        .unwrap()
        .video_id;

    let playback = PlaybackOrchestrator::neu(km.clone(), backend.clone(), BlobRegistry::neu());
    playback.loeschen(&video_id).await.unwrap();

    assert!(backend.videos.lock().is_empty());
    assert!(km.all_video_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_loeschen_behaelt_schluessel_wenn_server_fehlschlaegt() {
    let km = test_key_manager().await;
    let backend = FakeBackend::neu();
    let upload = UploadOrchestrator::neu(km.clone(), backend.clone());
    let video_id = upload
        .hochladen(
            &VideoDatei::neu("a.bin", "application/octet-stream", testdaten(64)),
            UploadOptionen::default(),
            &KeinFortschritt,
        )
        .await
        .unwrap()
        .video_id;

    backend.loesch_fehler.store(true, Ordering::SeqCst);
    let playback = PlaybackOrchestrator::neu(km.clone(), backend, BlobRegistry::neu());
    assert!(playback.loeschen(&video_id).await.is_err());
    assert_eq!(km.all_video_ids().await.unwrap(), vec![video_id]);
}
