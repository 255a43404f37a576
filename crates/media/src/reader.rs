//! Bounds-gepruefter Lese-Cursor ueber einem Byte-Puffer
//!
//! Alle Box-Zugriffe laufen ueber [`BoxReader`]. Kein Lesevorgang greift
//! ueber das Ende des Puffers hinaus; statt eines Panics wird
//! [`MediaError::Abgeschnitten`] geliefert.

use crate::error::{MediaError, MediaResult};

/// Cursor fuer Big-Endian-Felder
#[derive(Debug, Clone)]
pub struct BoxReader<'a> {
    daten: &'a [u8],
    position: usize,
}

impl<'a> BoxReader<'a> {
    pub fn neu(daten: &'a [u8]) -> Self {
        Self { daten, position: 0 }
    }

    /// Cursor an einer bestimmten Position
    pub fn ab(daten: &'a [u8], position: usize) -> Self {
        Self {
            daten,
            position: position.min(daten.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.daten.len() - self.position
    }

    pub fn read_u32(&mut self) -> MediaResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> MediaResult<u64> {
        let b = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_be_bytes(buf))
    }

    /// Liest einen 4-Zeichen-Box-Typ
    pub fn read_tag(&mut self) -> MediaResult<[u8; 4]> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    pub fn skip(&mut self, n: usize) -> MediaResult<()> {
        self.take(n).map(|_| ())
    }

    /// Gibt die naechsten `n` Bytes zurueck und rueckt vor
    pub fn take(&mut self, n: usize) -> MediaResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(MediaError::Abgeschnitten {
                position: self.position,
                benoetigt: n,
                verfuegbar: self.remaining(),
            });
        }
        let start = self.position;
        self.position += n;
        Ok(&self.daten[start..self.position])
    }
}
