//! Fortschritts-Ereignisse
//!
//! Jeder laengere Ablauf (Bereinigen, Verschluesseln, Hochladen,
//! Entschluesseln) meldet typisierte Fortschritts-Ereignisse an einen
//! Beobachter. Die Ereignisse sind reine UI-Rueckmeldung, kein
//! wiederaufnehmbares Protokoll.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Stufe eines Ablaufs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stufe {
    Lesen,
    Bereinigen,
    SchluesselErzeugen,
    Verschluesseln,
    Hochladen,
    SchluesselSpeichern,
    SchluesselLaden,
    Herunterladen,
    Entschluesseln,
    Wiedergabe,
    Fertig,
}

/// Ein einzelnes Fortschritts-Ereignis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fortschritt {
    pub stufe: Stufe,
    /// 0 bis 100
    pub prozent: u8,
    /// Menschenlesbarer Status
    pub nachricht: String,
}

impl Fortschritt {
    pub fn neu(stufe: Stufe, prozent: u8, nachricht: impl Into<String>) -> Self {
        Self {
            stufe,
            prozent: prozent.min(100),
            nachricht: nachricht.into(),
        }
    }
}

/// Empfaenger fuer Fortschritts-Ereignisse
pub trait FortschrittsBeobachter: Send + Sync {
    fn melden(&self, fortschritt: &Fortschritt);
}

impl<F> FortschrittsBeobachter for F
where
    F: Fn(&Fortschritt) + Send + Sync,
{
    fn melden(&self, fortschritt: &Fortschritt) {
        self(fortschritt)
    }
}

/// Beobachter, der alle Ereignisse verwirft
#[derive(Debug, Clone, Copy, Default)]
pub struct KeinFortschritt;

impl FortschrittsBeobachter for KeinFortschritt {
    fn melden(&self, _fortschritt: &Fortschritt) {}
}

/// Monoton steigender Gesamtfortschritt ueber mehrere Teilschritte
///
/// Teilschritte melden jeweils 0-100, die Skala bildet das auf ein
/// Fenster `[von, bis]` des Gesamtfortschritts ab. Werte unterhalb des
/// bisher gemeldeten Maximums werden auf das Maximum angehoben.
pub struct FortschrittsSkala<'a> {
    ziel: &'a dyn FortschrittsBeobachter,
    hoechster: AtomicU8,
}

impl<'a> FortschrittsSkala<'a> {
    pub fn neu(ziel: &'a dyn FortschrittsBeobachter) -> Self {
        Self {
            ziel,
            hoechster: AtomicU8::new(0),
        }
    }

    /// Meldet einen absoluten Gesamtwert
    pub fn melden(&self, stufe: Stufe, prozent: u8, nachricht: impl Into<String>) {
        let prozent = prozent.min(100);
        let vorher = self.hoechster.fetch_max(prozent, Ordering::SeqCst);
        let wert = vorher.max(prozent);
        self.ziel.melden(&Fortschritt::neu(stufe, wert, nachricht));
    }

    /// Zuletzt gemeldeter Gesamtwert
    pub fn aktuell(&self) -> u8 {
        self.hoechster.load(Ordering::SeqCst)
    }

    /// Erzeugt einen Beobachter fuer einen Teilschritt
    pub fn fenster(&self, von: u8, bis: u8) -> Fenster<'_, 'a> {
        Fenster {
            skala: self,
            von: von.min(bis),
            bis: bis.max(von).min(100),
        }
    }
}

/// Teilschritt-Beobachter einer [`FortschrittsSkala`]
pub struct Fenster<'s, 'a> {
    skala: &'s FortschrittsSkala<'a>,
    von: u8,
    bis: u8,
}

impl FortschrittsBeobachter for Fenster<'_, '_> {
    fn melden(&self, fortschritt: &Fortschritt) {
        let breite = u32::from(self.bis - self.von);
        let innen = u32::from(fortschritt.prozent.min(100));
        let wert = u32::from(self.von) + breite * innen / 100;
        self.skala
            .melden(fortschritt.stufe, wert as u8, fortschritt.nachricht.clone());
    }
}
