//! ISO-BMFF (MP4) Box-Walker
//!
//! Eine MP4-Datei ist eine Folge von Boxen: 32-Bit-Groesse (Big Endian),
//! 4-Zeichen-Typ, Nutzdaten. Groesse 1 bedeutet, dass eine 64-Bit-Groesse
//! folgt.
//!
//! ## Bereinigung
//!
//! ```text
//! oberste Ebene   Metadaten-Box  -> entfernt
//!                 moov           -> neu aufgebaut (trak/mdia/minf/stbl rekursiv)
//!                 sonstige       -> unveraendert
//! ```
//!
//! Werden Bytes vor `mdat` entfernt, verschieben sich die Nutzdaten. Die
//! Chunk-Offset-Tabellen (`stco`, `co64`) werden deshalb auf die neuen
//! Positionen umgerechnet.

use std::fmt;
use std::ops::Range;

use bytes::{BufMut, BytesMut};

use crate::error::{MediaError, MediaResult};
use crate::reader::BoxReader;
use crate::report::EntfernteBox;

// ---------------------------------------------------------------------------
// Box-Typen
// ---------------------------------------------------------------------------

/// 4-Zeichen-Box-Typ
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxTyp(pub [u8; 4]);

impl BoxTyp {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MOOF: Self = Self(*b"moof");
    pub const MDAT: Self = Self(*b"mdat");
    pub const TRAK: Self = Self(*b"trak");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MINF: Self = Self(*b"minf");
    pub const STBL: Self = Self(*b"stbl");
    pub const STCO: Self = Self(*b"stco");
    pub const CO64: Self = Self(*b"co64");
    pub const UDTA: Self = Self(*b"udta");

    /// Box traegt Metadaten und wird entfernt
    pub fn ist_metadaten(self) -> bool {
        METADATEN_BOXEN.contains(&self)
    }

    /// Container unterhalb von `moov`, deren Kinder geprueft werden
    pub fn ist_container(self) -> bool {
        [Self::TRAK, Self::MDIA, Self::MINF, Self::STBL].contains(&self)
    }
}

impl fmt::Display for BoxTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Latin-1, damit '©xyz' lesbar bleibt
        for &b in &self.0 {
            write!(f, "{}", char::from(b))?;
        }
        Ok(())
    }
}

impl fmt::Debug for BoxTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoxTyp({self})")
    }
}

/// Boxen mit identifizierenden Metadaten (Autor, Titel, GPS, ...)
pub const METADATEN_BOXEN: [BoxTyp; 12] = [
    BoxTyp(*b"uuid"),
    BoxTyp(*b"meta"),
    BoxTyp(*b"udta"),
    BoxTyp(*b"cprt"),
    BoxTyp(*b"gnre"),
    BoxTyp(*b"perf"),
    BoxTyp(*b"auth"),
    BoxTyp(*b"titl"),
    BoxTyp(*b"dscp"),
    BoxTyp(*b"loci"),
    BoxTyp(*b"xyz "),
    BoxTyp([0xA9, b'x', b'y', b'z']),
];

// ---------------------------------------------------------------------------
// Box-Header
// ---------------------------------------------------------------------------

/// Gelesener Box-Header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub typ: BoxTyp,
    /// Offset des Headers im Puffer
    pub start: usize,
    /// 8, bei 64-Bit-Groesse 16
    pub kopf_laenge: usize,
    /// Gesamtgroesse inklusive Header
    pub groesse: usize,
    /// 64-Bit-Groesse (size == 1)
    pub erweitert: bool,
}

/// Grund fuer das Ende des Box-Walks vor Pufferende
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abbruch {
    /// Weniger als ein vollstaendiger Header uebrig
    KopfUnvollstaendig { offset: usize, verfuegbar: usize },
    /// Groesse 0 ("bis Dateiende") wird nicht ausgewertet
    GroesseNull { offset: usize, typ: BoxTyp },
    /// Groesse kleiner als der Header selbst
    GroesseZuKlein { offset: usize, typ: BoxTyp, groesse: u64 },
    /// Box reicht ueber das Pufferende hinaus
    UeberEnde {
        offset: usize,
        typ: BoxTyp,
        groesse: u64,
        verfuegbar: usize,
    },
}

impl Abbruch {
    pub fn offset(&self) -> usize {
        match self {
            Self::KopfUnvollstaendig { offset, .. }
            | Self::GroesseNull { offset, .. }
            | Self::GroesseZuKlein { offset, .. }
            | Self::UeberEnde { offset, .. } => *offset,
        }
    }

    pub fn typ(&self) -> Option<BoxTyp> {
        match self {
            Self::KopfUnvollstaendig { .. } => None,
            Self::GroesseNull { typ, .. }
            | Self::GroesseZuKlein { typ, .. }
            | Self::UeberEnde { typ, .. } => Some(*typ),
        }
    }
}

impl fmt::Display for Abbruch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KopfUnvollstaendig { offset, verfuegbar } => write!(
                f,
                "unvollstaendiger Box-Header bei Offset {offset} ({verfuegbar} Bytes uebrig)"
            ),
            Self::GroesseNull { offset, typ } => {
                write!(f, "Box '{typ}' bei Offset {offset} hat Groesse 0")
            }
            Self::GroesseZuKlein {
                offset,
                typ,
                groesse,
            } => write!(
                f,
                "Box '{typ}' bei Offset {offset} hat ungueltige Groesse {groesse}"
            ),
            Self::UeberEnde {
                offset,
                typ,
                groesse,
                verfuegbar,
            } => write!(
                f,
                "Box '{typ}' bei Offset {offset} ({groesse} Bytes) reicht ueber das Ende ({verfuegbar} Bytes verfuegbar)"
            ),
        }
    }
}

impl BoxHeader {
    /// Liest den Header der Box bei `start`; die Box muss vor `ende` enden
    pub fn lesen(daten: &[u8], start: usize, ende: usize) -> Result<Self, Abbruch> {
        let ende = ende.min(daten.len());
        let verfuegbar = ende.saturating_sub(start);
        let kopf_fehlt = || Abbruch::KopfUnvollstaendig {
            offset: start,
            verfuegbar,
        };

        let mut r = BoxReader::ab(&daten[..ende], start);
        let groesse32 = r.read_u32().map_err(|_| kopf_fehlt())?;
        let typ = BoxTyp(r.read_tag().map_err(|_| kopf_fehlt())?);

        let (groesse, kopf_laenge, erweitert) = match groesse32 {
            0 => return Err(Abbruch::GroesseNull { offset: start, typ }),
            1 => (r.read_u64().map_err(|_| kopf_fehlt())?, 16, true),
            g => (u64::from(g), 8, false),
        };

        if groesse < kopf_laenge as u64 {
            return Err(Abbruch::GroesseZuKlein {
                offset: start,
                typ,
                groesse,
            });
        }
        if groesse > verfuegbar as u64 {
            return Err(Abbruch::UeberEnde {
                offset: start,
                typ,
                groesse,
                verfuegbar,
            });
        }

        Ok(Self {
            typ,
            start,
            kopf_laenge,
            groesse: groesse as usize,
            erweitert,
        })
    }

    pub fn ende(&self) -> usize {
        self.start + self.groesse
    }

    /// Offset der Nutzdaten (nach dem Header)
    pub fn nutzdaten(&self) -> usize {
        self.start + self.kopf_laenge
    }
}

// ---------------------------------------------------------------------------
// Bereinigung
// ---------------------------------------------------------------------------

/// Ergebnis der MP4-Bereinigung
#[derive(Debug)]
pub struct Mp4Bereinigung {
    pub daten: Vec<u8>,
    pub entfernte_boxen: Vec<EntfernteBox>,
    pub hinweise: Vec<String>,
    pub erweiterte_groesse: bool,
    pub abbruch: Option<Abbruch>,
    /// Nach einem Abbruch ungeprueft kopierter Rest; kann Metadaten enthalten
    pub rest_ungeprueft: bool,
}

/// Entfernt alle Metadaten-Boxen und baut `moov` neu auf
pub fn bereinigen(daten: &[u8]) -> MediaResult<Mp4Bereinigung> {
    let mut planer = Planer::neu(daten);
    let (knoten, abbruch) = planer.oberste_ebene()?;

    if planer.fragmentiert && !planer.entfernt.is_empty() {
        planer.hinweise.push(
            "Fragmentierte Datei (moof): absolute Offsets in tfhd werden nicht angepasst".into(),
        );
    }

    let mut ausgabe = BytesMut::with_capacity(daten.len());
    planer.schreiben(&knoten, &mut ausgabe)?;

    Ok(Mp4Bereinigung {
        daten: ausgabe.to_vec(),
        entfernte_boxen: planer.boxen,
        hinweise: planer.hinweise,
        erweiterte_groesse: planer.erweitert,
        abbruch,
        rest_ungeprueft: planer.rest_kopiert,
    })
}

#[derive(Debug)]
enum Knoten {
    Kopieren(Range<usize>),
    Entfernen,
    Container { header: BoxHeader, kinder: Vec<Knoten> },
    ChunkOffsets { header: BoxHeader, breite: usize },
}

fn neue_groesse(knoten: &Knoten) -> usize {
    match knoten {
        Knoten::Kopieren(bereich) => bereich.len(),
        Knoten::Entfernen => 0,
        Knoten::Container { header, kinder } => {
            header.kopf_laenge + kinder.iter().map(neue_groesse).sum::<usize>()
        }
        Knoten::ChunkOffsets { header, .. } => header.groesse,
    }
}

struct Planer<'a> {
    daten: &'a [u8],
    /// Entfernte Bereiche in Dateireihenfolge
    entfernt: Vec<Range<usize>>,
    boxen: Vec<EntfernteBox>,
    hinweise: Vec<String>,
    erweitert: bool,
    fragmentiert: bool,
    rest_kopiert: bool,
}

impl<'a> Planer<'a> {
    fn neu(daten: &'a [u8]) -> Self {
        Self {
            daten,
            entfernt: Vec::new(),
            boxen: Vec::new(),
            hinweise: Vec::new(),
            erweitert: false,
            fragmentiert: false,
            rest_kopiert: false,
        }
    }

    fn oberste_ebene(&mut self) -> MediaResult<(Vec<Knoten>, Option<Abbruch>)> {
        let mut knoten = Vec::new();
        let mut pos = 0;

        while pos < self.daten.len() {
            match BoxHeader::lesen(self.daten, pos, self.daten.len()) {
                Ok(header) => {
                    if header.typ == BoxTyp::MOOF {
                        self.fragmentiert = true;
                    }
                    knoten.push(self.einordnen(header, "")?);
                    pos = header.ende();
                }
                Err(abbruch) => {
                    tracing::debug!(offset = pos, grund = %abbruch, "Box-Walk beendet");
                    knoten.push(self.rest(pos, &abbruch));
                    return Ok((knoten, Some(abbruch)));
                }
            }
        }

        Ok((knoten, None))
    }

    fn einordnen(&mut self, header: BoxHeader, eltern: &str) -> MediaResult<Knoten> {
        self.erweitert |= header.erweitert;
        let pfad = if eltern.is_empty() {
            header.typ.to_string()
        } else {
            format!("{eltern}/{}", header.typ)
        };

        if header.typ.ist_metadaten() {
            self.entfernen(header.start..header.ende(), pfad);
            return Ok(Knoten::Entfernen);
        }

        let container = if eltern.is_empty() {
            header.typ == BoxTyp::MOOV
        } else {
            header.typ.ist_container()
        };
        if container {
            let kinder = self.kinder(&header, &pfad)?;
            return Ok(Knoten::Container { header, kinder });
        }

        if !eltern.is_empty() {
            if header.typ == BoxTyp::STCO {
                return Ok(Knoten::ChunkOffsets { header, breite: 4 });
            }
            if header.typ == BoxTyp::CO64 {
                return Ok(Knoten::ChunkOffsets { header, breite: 8 });
            }
        }

        Ok(Knoten::Kopieren(header.start..header.ende()))
    }

    fn kinder(&mut self, header: &BoxHeader, pfad: &str) -> MediaResult<Vec<Knoten>> {
        let mut kinder = Vec::new();
        let mut pos = header.nutzdaten();
        let ende = header.ende();

        while pos < ende {
            if ende - pos < 8 {
                self.hinweise
                    .push(format!("{pfad}: {} Fuellbytes uebernommen", ende - pos));
                kinder.push(Knoten::Kopieren(pos..ende));
                break;
            }
            let kind = BoxHeader::lesen(self.daten, pos, ende)
                .map_err(|abbruch| MediaError::ungueltige_box(format!("{pfad}: {abbruch}")))?;
            kinder.push(self.einordnen(kind, pfad)?);
            pos = kind.ende();
        }

        Ok(kinder)
    }

    /// Rest nach einem Abbruch: Metadaten und unlesbares `moov` fallen weg
    fn rest(&mut self, start: usize, abbruch: &Abbruch) -> Knoten {
        let ende = self.daten.len();
        match abbruch.typ() {
            Some(typ) if typ.ist_metadaten() || typ == BoxTyp::MOOV => {
                self.hinweise
                    .push(format!("{abbruch}; Rest ab Offset {start} entfernt"));
                self.entfernen(start..ende, typ.to_string());
                Knoten::Entfernen
            }
            _ => {
                self.hinweise
                    .push(format!("{abbruch}; Rest ab Offset {start} unveraendert"));
                self.rest_kopiert = true;
                Knoten::Kopieren(start..ende)
            }
        }
    }

    fn entfernen(&mut self, bereich: Range<usize>, pfad: String) {
        let typ = pfad.rsplit('/').next().unwrap_or_default().to_string();
        tracing::debug!(box_pfad = %pfad, bytes = bereich.len(), "Metadaten-Box entfernt");
        self.boxen.push(EntfernteBox {
            pfad,
            typ,
            offset: bereich.start as u64,
            groesse: bereich.len() as u64,
        });
        self.entfernt.push(bereich);
    }

    fn schreiben(&self, knoten: &[Knoten], aus: &mut BytesMut) -> MediaResult<()> {
        for k in knoten {
            match k {
                Knoten::Kopieren(bereich) => aus.put_slice(&self.daten[bereich.clone()]),
                Knoten::Entfernen => {}
                Knoten::Container { header, kinder } => {
                    kopf_schreiben(aus, header, neue_groesse(k))?;
                    self.schreiben(kinder, aus)?;
                }
                Knoten::ChunkOffsets { header, breite } => {
                    self.offsets_schreiben(header, *breite, aus)?
                }
            }
        }
        Ok(())
    }

    fn offsets_schreiben(
        &self,
        header: &BoxHeader,
        breite: usize,
        aus: &mut BytesMut,
    ) -> MediaResult<()> {
        let box_daten = &self.daten[header.start..header.ende()];
        let fehler = |e: MediaError| MediaError::ungueltige_box(format!("{}: {e}", header.typ));

        let mut r = BoxReader::ab(box_daten, header.kopf_laenge);
        let version_flags = r.read_u32().map_err(fehler)?;
        let anzahl = r.read_u32().map_err(fehler)?;

        aus.put_slice(&box_daten[..header.kopf_laenge]);
        aus.put_u32(version_flags);
        aus.put_u32(anzahl);

        for _ in 0..anzahl {
            if breite == 4 {
                let alt = r.read_u32().map_err(fehler)?;
                let neu = self.verschieben(u64::from(alt))?;
                let neu = u32::try_from(neu).map_err(|_| {
                    MediaError::ungueltige_box(format!("stco: Offset {neu} zu gross"))
                })?;
                aus.put_u32(neu);
            } else {
                let alt = r.read_u64().map_err(fehler)?;
                aus.put_u64(self.verschieben(alt)?);
            }
        }

        let rest = r.remaining();
        aus.put_slice(r.take(rest).map_err(fehler)?);
        Ok(())
    }

    /// Rechnet einen Datei-Offset auf die bereinigte Ausgabe um
    fn verschieben(&self, alt: u64) -> MediaResult<u64> {
        let mut abzug = 0u64;
        for bereich in &self.entfernt {
            let (start, ende) = (bereich.start as u64, bereich.end as u64);
            if ende <= alt {
                abzug += ende - start;
            } else if start <= alt {
                return Err(MediaError::ungueltige_box(format!(
                    "Chunk-Offset {alt} zeigt in entfernte Daten"
                )));
            }
        }
        Ok(alt - abzug)
    }
}

fn kopf_schreiben(aus: &mut BytesMut, header: &BoxHeader, groesse: usize) -> MediaResult<()> {
    if header.erweitert {
        aus.put_u32(1);
        aus.put_slice(&header.typ.0);
        aus.put_u64(groesse as u64);
    } else {
        let groesse = u32::try_from(groesse).map_err(|_| {
            MediaError::ungueltige_box(format!("{}: Groesse {groesse} passt nicht in 32 Bit", header.typ))
        })?;
        aus.put_u32(groesse);
        aus.put_slice(&header.typ.0);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Auflistung (nur lesend)
// ---------------------------------------------------------------------------

/// Eine gefundene Box
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BoxInfo {
    pub pfad: String,
    pub offset: u64,
    pub groesse: u64,
    pub metadaten: bool,
}

/// Listet alle Boxen auf (oberste Ebene, `moov`-Baum und `udta`-Inhalt)
pub fn boxen_auflisten(daten: &[u8]) -> (Vec<BoxInfo>, Option<Abbruch>, bool) {
    let mut boxen = Vec::new();
    let mut erweitert = false;
    let abbruch = auflisten_in(daten, 0, daten.len(), "", &mut boxen, &mut erweitert);
    (boxen, abbruch, erweitert)
}

fn auflisten_in(
    daten: &[u8],
    start: usize,
    ende: usize,
    eltern: &str,
    boxen: &mut Vec<BoxInfo>,
    erweitert: &mut bool,
) -> Option<Abbruch> {
    let mut pos = start;
    while pos < ende {
        let header = match BoxHeader::lesen(daten, pos, ende) {
            Ok(h) => h,
            Err(abbruch) => return Some(abbruch),
        };
        *erweitert |= header.erweitert;

        let pfad = if eltern.is_empty() {
            header.typ.to_string()
        } else {
            format!("{eltern}/{}", header.typ)
        };
        boxen.push(BoxInfo {
            pfad: pfad.clone(),
            offset: header.start as u64,
            groesse: header.groesse as u64,
            metadaten: header.typ.ist_metadaten(),
        });

        let absteigen = header.typ == BoxTyp::MOOV
            || header.typ == BoxTyp::UDTA
            || (!eltern.is_empty() && header.typ.ist_container());
        if absteigen {
            // Fehler im Inneren beenden nur die Auflistung dieses Containers
            let _ = auflisten_in(
                daten,
                header.nutzdaten(),
                header.ende(),
                &pfad,
                boxen,
                erweitert,
            );
        }

        pos = header.ende();
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
