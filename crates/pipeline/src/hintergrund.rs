//! Rechenintensive Schritte auf dem Blocking-Pool
//!
//! Bereinigen, Ver- und Entschluesseln arbeiten auf der ganzen Datei
//! und duerfen keinen Runtime-Worker belegen. Fortschritt aus dem
//! Blocking-Thread wird ueber einen Kanal an den Beobachter des
//! aufrufenden Tasks weitergereicht.

use clipvault_core::{Fortschritt, FortschrittsBeobachter};
use tokio::sync::mpsc;

use crate::error::{VaultError, VaultResult};

pub(crate) async fn blockierend<T, F>(
    ziel: &dyn FortschrittsBeobachter,
    arbeit: F,
) -> VaultResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn FortschrittsBeobachter) -> VaultResult<T> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Fortschritt>();
    let aufgabe = tokio::task::spawn_blocking(move || {
        let weiterleiten = move |f: &Fortschritt| {
            // Empfaenger lebt bis die Aufgabe fertig ist
            let _ = tx.send(f.clone());
        };
        arbeit(&weiterleiten)
    });

    // Endet sobald der Sender mit der Aufgabe verworfen wird
    while let Some(fortschritt) = rx.recv().await {
        ziel.melden(&fortschritt);
    }

    match aufgabe.await {
        Ok(ergebnis) => ergebnis,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(VaultError::PlattformNichtUnterstuetzt(format!(
            "Hintergrundaufgabe abgebrochen: {e}"
        ))),
    }
}
