//! Human-placed annotations stored in `sidescan-marks.mra`.
//!
//! Each record is a 36-byte numeric header followed by two text fields:
//!
//! ```text
//! center_x: f64 | center_y: f64 | width: f64 | height: f64 | text_len: u32
//! id_units: u16 | id: [u16; id_units] | desc_units: u16 | desc: [u16; desc_units]
//! ```
//!
//! All integers and UTF-16 code units are big-endian. `text_len` is the
//! byte length of everything after the header, so a reader can validate a
//! record before decoding its text.

use serde::{Deserialize, Serialize};
use sidescan_error::{Result, SidescanError};

/// Byte size of the numeric header that starts every mark record.
pub const MARK_HEADER_BYTES: usize = 36;

/// Rectangle covered by a mark, in mosaic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkBounds {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

/// A user annotation over the sonar mosaic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub bounds: MarkBounds,
    pub id: String,
    pub description: String,
}

impl Mark {
    #[must_use]
    pub fn new(bounds: MarkBounds, id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            bounds,
            id: id.into(),
            description: description.into(),
        }
    }

    /// Encode the mark, appending its bytes to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let id_units: Vec<u16> = self.id.encode_utf16().collect();
        let desc_units: Vec<u16> = self.description.encode_utf16().collect();
        let id_len = unit_count("mark id", id_units.len())?;
        let desc_len = unit_count("mark description", desc_units.len())?;
        let text_len = 4 + 2 * (id_units.len() + desc_units.len());
        let text_len = u32::try_from(text_len).map_err(|_| SidescanError::OutOfRange {
            what: "mark text length".to_owned(),
            value: text_len.to_string(),
        })?;

        out.reserve(MARK_HEADER_BYTES + text_len as usize);
        out.extend_from_slice(&self.bounds.center_x.to_be_bytes());
        out.extend_from_slice(&self.bounds.center_y.to_be_bytes());
        out.extend_from_slice(&self.bounds.width.to_be_bytes());
        out.extend_from_slice(&self.bounds.height.to_be_bytes());
        out.extend_from_slice(&text_len.to_be_bytes());

        out.extend_from_slice(&id_len.to_be_bytes());
        for unit in id_units {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        out.extend_from_slice(&desc_len.to_be_bytes());
        for unit in desc_units {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        Ok(())
    }

    /// Encode the mark into a fresh buffer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Decode one mark from the start of `bytes`, returning it together with
    /// the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut reader = ByteReader::new(bytes);
        let header = reader.take(MARK_HEADER_BYTES).ok_or(SidescanError::TruncatedRecord {
            expected: MARK_HEADER_BYTES,
            actual: bytes.len(),
        })?;

        let bounds = MarkBounds {
            center_x: f64::from_be_bytes(fixed(&header[0..8])),
            center_y: f64::from_be_bytes(fixed(&header[8..16])),
            width: f64::from_be_bytes(fixed(&header[16..24])),
            height: f64::from_be_bytes(fixed(&header[24..32])),
        };
        let text_len = u32::from_be_bytes(fixed(&header[32..36])) as usize;

        let text = reader
            .take(text_len)
            .ok_or(SidescanError::TruncatedRecord {
                expected: MARK_HEADER_BYTES + text_len,
                actual: bytes.len(),
            })?;

        let mut text_reader = ByteReader::new(text);
        let id = text_reader.read_utf16("mark id")?;
        let description = text_reader.read_utf16("mark description")?;
        if text_reader.remaining() != 0 {
            return Err(SidescanError::corrupt(format!(
                "mark text length {text_len} leaves {} unread bytes",
                text_reader.remaining()
            )));
        }

        Ok((
            Self {
                bounds,
                id,
                description,
            },
            MARK_HEADER_BYTES + text_len,
        ))
    }
}

/// Encode a sequence of marks back to back.
pub fn encode_marks(marks: &[Mark]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for mark in marks {
        mark.encode_into(&mut out)?;
    }
    Ok(out)
}

/// Decode every mark in a marks file image.
pub fn decode_marks(bytes: &[u8]) -> Result<Vec<Mark>> {
    let mut marks = Vec::new();
    let mut cursor = 0_usize;
    while cursor < bytes.len() {
        let (mark, consumed) = Mark::decode(&bytes[cursor..])?;
        marks.push(mark);
        cursor += consumed;
    }
    Ok(marks)
}

fn unit_count(what: &str, units: usize) -> Result<u16> {
    u16::try_from(units).map_err(|_| SidescanError::OutOfRange {
        what: format!("{what} length"),
        value: format!("{units} UTF-16 units"),
    })
}

fn fixed<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0_u8; N];
    out.copy_from_slice(slice);
    out
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(len)?;
        let slice = self.bytes.get(self.position..end)?;
        self.position = end;
        Some(slice)
    }

    fn read_utf16(&mut self, what: &str) -> Result<String> {
        let len_bytes = self
            .take(2)
            .ok_or_else(|| SidescanError::corrupt(format!("{what} length prefix truncated")))?;
        let units = usize::from(u16::from_be_bytes(fixed(len_bytes)));
        let raw = self
            .take(units * 2)
            .ok_or_else(|| SidescanError::corrupt(format!("{what} text truncated")))?;
        let code_units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&code_units)
            .map_err(|err| SidescanError::corrupt(format!("{what} is not valid UTF-16: {err}")))
    }
}
