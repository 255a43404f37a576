//! Unit-Tests fuer den KeyManager

use clipvault_core::{KeinFortschritt, VideoDatei, VideoId};
use clipvault_crypto::{decrypt_video, encrypt_video, export_key, generate_key};
use serde_json::json;

use super::{test_key_manager, testdaten};
use crate::error::VaultError;
use crate::key_manager::LoeschBestaetigung;

#[tokio::test]
async fn test_ende_zu_ende_schluessel_aus_speicher() {
    let km = test_key_manager().await;
    let original = testdaten(1024 * 1024);
    let datei = VideoDatei::neu("clip.mp4", "video/mp4", original.clone());

    let video_id = VideoId::from("v1");
    {
        let key = generate_key().unwrap();
        let envelope = encrypt_video(&datei, &key, &KeinFortschritt).unwrap();
        km.store_key(
            &video_id,
            &key,
            &envelope.iv,
            &serde_json::to_value(&envelope.metadata).unwrap(),
        )
        .await
        .unwrap();

        // Schluessel-Variable geht hier verloren, nur der Ciphertext bleibt
        let ciphertext = envelope.ciphertext;
        let gespeichert = km.retrieve_key(&video_id).await.unwrap();
        let klartext =
            decrypt_video(&ciphertext, &gespeichert.key, &gespeichert.iv, &KeinFortschritt)
                .unwrap();
        assert_eq!(klartext, original);
        assert_eq!(gespeichert.metadata["originalSize"], 1024 * 1024);
    }
}

#[tokio::test]
async fn test_unbekannte_id_liefert_schluessel_fehlt() {
    let km = test_key_manager().await;
    let err = km.retrieve_key(&VideoId::from("gibt-es-nicht")).await.unwrap_err();
    match err {
        VaultError::SchluesselNichtGefunden { video_id } => {
            assert_eq!(video_id.as_str(), "gibt-es-nicht")
        }
        andere => panic!("Unerwarteter Fehler: {andere:?}"),
    }
}

#[tokio::test]
async fn test_zweites_speichern_ersetzt() {
    let km = test_key_manager().await;
    let id = VideoId::from("v1");
    let erster = generate_key().unwrap();
    let zweiter = generate_key().unwrap();
    let envelope = encrypt_video(
        &VideoDatei::neu("a", "video/mp4", vec![1, 2, 3]),
        &zweiter,
        &KeinFortschritt,
    )
    .unwrap();

    km.store_key(&id, &erster, &envelope.iv, &json!({ "n": 1 }))
        .await
        .unwrap();
    km.store_key(&id, &zweiter, &envelope.iv, &json!({ "n": 2 }))
        .await
        .unwrap();

    let gespeichert = km.retrieve_key(&id).await.unwrap();
    assert_eq!(export_key(&gespeichert.key), export_key(&zweiter));
    assert_eq!(gespeichert.metadata["n"], 2);
    assert_eq!(km.all_video_ids().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_leere_id_wird_abgelehnt() {
    let km = test_key_manager().await;
    let key = generate_key().unwrap();
    let envelope =
        encrypt_video(&VideoDatei::neu("a", "video/mp4", vec![0]), &key, &KeinFortschritt)
            .unwrap();
    let err = km
        .store_key(&VideoId::from(""), &key, &envelope.iv, &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::UngueltigesFormat(_)));
}

#[tokio::test]
async fn test_loeschen_ohne_eintrag_ist_kein_fehler() {
    let km = test_key_manager().await;
    assert!(!km.delete_key(&VideoId::from("v7")).await.unwrap());
}

#[tokio::test]
async fn test_export_import_ist_idempotent() {
    let quelle = test_key_manager().await;
    for id in ["v1", "v2", "v3"] {
        let key = generate_key().unwrap();
        let envelope =
            encrypt_video(&VideoDatei::neu(id, "video/mp4", vec![7; 16]), &key, &KeinFortschritt)
                .unwrap();
        quelle
            .store_key(&VideoId::from(id), &key, &envelope.iv, &json!({ "id": id }))
            .await
            .unwrap();
    }
    let backup = quelle.export_all_keys().await.unwrap();

    let ziel = test_key_manager().await;
    assert_eq!(ziel.import_keys(&backup).await.unwrap(), 3);
    assert_eq!(ziel.import_keys(&backup).await.unwrap(), 3);
    assert_eq!(ziel.anzahl().await.unwrap(), 3);

    for id in ["v1", "v2", "v3"] {
        let id = VideoId::from(id);
        let a = quelle.retrieve_key(&id).await.unwrap();
        let b = ziel.retrieve_key(&id).await.unwrap();
        assert_eq!(export_key(&a.key), export_key(&b.key));
        assert_eq!(a.iv, b.iv);
        assert_eq!(a.metadata, b.metadata);
        assert_eq!(a.gespeichert_am, b.gespeichert_am);
    }
}

#[tokio::test]
async fn test_ungueltiges_backup_aendert_nichts() {
    let km = test_key_manager().await;
    let backup = json!({
        "version": 1,
        "exportDate": "2026-01-01T00:00:00.000Z",
        "keys": [
            {
                "videoId": "gut",
                "keyData": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
                "iv": "AAAAAAAAAAAAAAAA",
                "metadata": {},
                "timestamp": 1767225600000i64
            },
            {
                "videoId": "kaputt",
                "keyData": "zu-kurz",
                "iv": "AAAAAAAAAAAAAAAA",
                "timestamp": 1767225600000i64
            }
        ]
    })
    .to_string();

    let err = km.import_keys(&backup).await.unwrap_err();
    assert!(matches!(err, VaultError::UngueltigesFormat(ref m) if m.contains("Eintrag 1")));
    assert!(km.all_video_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_backup_ohne_keys_ist_formatfehler() {
    let km = test_key_manager().await;
    for kaputt in ["kein json", "{}", r#"{"keys": 5}"#, "[]"] {
        let err = km.import_keys(kaputt).await.unwrap_err();
        assert!(
            matches!(err, VaultError::UngueltigesFormat(_)),
            "{kaputt}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_alle_loeschen_braucht_bestaetigung() {
    let km = test_key_manager().await;
    let key = generate_key().unwrap();
    let envelope =
        encrypt_video(&VideoDatei::neu("a", "video/mp4", vec![0]), &key, &KeinFortschritt)
            .unwrap();
    km.store_key(&VideoId::from("v1"), &key, &envelope.iv, &json!({}))
        .await
        .unwrap();

    assert!(matches!(
        LoeschBestaetigung::aus_flag(false),
        Err(VaultError::BestaetigungFehlt)
    ));
    assert_eq!(km.anzahl().await.unwrap(), 1);

    let bestaetigt = LoeschBestaetigung::aus_flag(true).unwrap();
    assert_eq!(km.clear_all_keys(bestaetigt).await.unwrap(), 1);
    assert_eq!(km.anzahl().await.unwrap(), 0);
}
