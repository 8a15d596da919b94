//! Fixed-width ping metadata record stored in `sidescan-index.mra`.
//!
//! Layout (54 bytes, big-endian, no padding):
//! - `offset: u64`
//! - `timestamp_millis: i64`
//! - `latitude_degs: f64`
//! - `longitude_degs: f64`
//! - `altitude: f32`
//! - `heading_degs: f32`
//! - `speed: f32`
//! - `frequency: i32`
//! - `range: i32`
//! - `sample_byte_count: i16`

use std::ops::Range;

use serde::{Deserialize, Serialize};
use sidescan_error::{Result, SidescanError};

/// Exact byte size of an encoded [`PingRecord`].
pub const PING_RECORD_BYTES: usize = 54;

const OFFSET_AT: usize = 0;
const TIMESTAMP_AT: usize = 8;
const LATITUDE_AT: usize = 16;
const LONGITUDE_AT: usize = 24;
const ALTITUDE_AT: usize = 32;
const HEADING_AT: usize = 36;
const SPEED_AT: usize = 40;
const FREQUENCY_AT: usize = 44;
const RANGE_AT: usize = 48;
const SAMPLE_COUNT_AT: usize = 52;

/// Metadata for one accepted sonar ping.
///
/// Heading is kept in degrees for the whole store. `speed` already carries
/// the builder's empirical correction factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PingRecord {
    /// Byte offset of this ping's samples inside `sidescan-data.mra`.
    pub offset: u64,
    /// Ping time, milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
    /// Absolute latitude in decimal degrees.
    pub latitude_degs: f64,
    /// Absolute longitude in decimal degrees.
    pub longitude_degs: f64,
    /// Altitude above the seabed in meters (0 when unknown).
    pub altitude: f32,
    /// Vehicle heading in degrees.
    pub heading_degs: f32,
    /// Horizontal speed in m/s.
    pub speed: f32,
    /// Operating frequency in Hz.
    pub frequency: i32,
    /// Acoustic half-swath range in meters.
    pub range: i32,
    /// Number of raw sample bytes in the data blob.
    pub sample_byte_count: i16,
}

impl PingRecord {
    /// Encode the record to its exact wire representation.
    #[must_use]
    pub fn encode(&self) -> [u8; PING_RECORD_BYTES] {
        let mut out = [0_u8; PING_RECORD_BYTES];
        out[OFFSET_AT..TIMESTAMP_AT].copy_from_slice(&self.offset.to_be_bytes());
        out[TIMESTAMP_AT..LATITUDE_AT].copy_from_slice(&self.timestamp_millis.to_be_bytes());
        out[LATITUDE_AT..LONGITUDE_AT].copy_from_slice(&self.latitude_degs.to_be_bytes());
        out[LONGITUDE_AT..ALTITUDE_AT].copy_from_slice(&self.longitude_degs.to_be_bytes());
        out[ALTITUDE_AT..HEADING_AT].copy_from_slice(&self.altitude.to_be_bytes());
        out[HEADING_AT..SPEED_AT].copy_from_slice(&self.heading_degs.to_be_bytes());
        out[SPEED_AT..FREQUENCY_AT].copy_from_slice(&self.speed.to_be_bytes());
        out[FREQUENCY_AT..RANGE_AT].copy_from_slice(&self.frequency.to_be_bytes());
        out[RANGE_AT..SAMPLE_COUNT_AT].copy_from_slice(&self.range.to_be_bytes());
        out[SAMPLE_COUNT_AT..PING_RECORD_BYTES]
            .copy_from_slice(&self.sample_byte_count.to_be_bytes());
        out
    }

    /// Decode a record from the first [`PING_RECORD_BYTES`] of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let Some(bytes) = bytes.get(..PING_RECORD_BYTES) else {
            return Err(SidescanError::TruncatedRecord {
                expected: PING_RECORD_BYTES,
                actual: bytes.len(),
            });
        };

        let sample_byte_count = i16::from_be_bytes(array_at(bytes, SAMPLE_COUNT_AT));
        if sample_byte_count < 0 {
            return Err(SidescanError::corrupt(format!(
                "negative sample byte count {sample_byte_count}"
            )));
        }

        Ok(Self {
            offset: u64::from_be_bytes(array_at(bytes, OFFSET_AT)),
            timestamp_millis: i64::from_be_bytes(array_at(bytes, TIMESTAMP_AT)),
            latitude_degs: f64::from_be_bytes(array_at(bytes, LATITUDE_AT)),
            longitude_degs: f64::from_be_bytes(array_at(bytes, LONGITUDE_AT)),
            altitude: f32::from_be_bytes(array_at(bytes, ALTITUDE_AT)),
            heading_degs: f32::from_be_bytes(array_at(bytes, HEADING_AT)),
            speed: f32::from_be_bytes(array_at(bytes, SPEED_AT)),
            frequency: i32::from_be_bytes(array_at(bytes, FREQUENCY_AT)),
            range: i32::from_be_bytes(array_at(bytes, RANGE_AT)),
            sample_byte_count,
        })
    }

    /// Number of sample bytes as `usize` (negative counts are rejected on decode).
    #[must_use]
    pub fn sample_len(&self) -> usize {
        usize::try_from(self.sample_byte_count).unwrap_or(0)
    }

    /// Byte range of this ping's samples in the data blob, or `None` when
    /// the end does not fit in `u64`/`usize`.
    #[must_use]
    pub fn sample_range(&self) -> Option<Range<usize>> {
        let start = usize::try_from(self.offset).ok()?;
        let end = start.checked_add(self.sample_len())?;
        Some(start..end)
    }
}

/// Copy `N` bytes starting at `start`. Callers guarantee the slice is at
/// least [`PING_RECORD_BYTES`] long and every field offset is in bounds.
fn array_at<const N: usize>(bytes: &[u8], start: usize) -> [u8; N] {
    let mut out = [0_u8; N];
    out.copy_from_slice(&bytes[start..start + N]);
    out
}
