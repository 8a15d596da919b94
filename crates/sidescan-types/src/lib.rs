//! Value types and fixed-width codecs for the sidescan store.
//!
//! - [`PingRecord`]: 54-byte big-endian ping metadata record
//! - [`Mark`]: annotation record with a 36-byte numeric header
//! - [`NavigationFix`] and [`GeoLocation`]: navigation state and WGS-84 helpers
//! - [`samples`]: raw sample decoding and 8-bit requantization

pub mod geo;
pub mod mark;
pub mod nav;
pub mod record;
pub mod samples;

pub use geo::{GeoLocation, wgs84_displace, wgs84_displacement};
pub use mark::{MARK_HEADER_BYTES, Mark, MarkBounds, decode_marks, encode_marks};
pub use nav::NavigationFix;
pub use record::{PING_RECORD_BYTES, PingRecord};
pub use samples::{
    INDEXED_BITS_PER_POINT, decode_samples, normalized_samples, to_indexed_samples,
};

/// File holding the concatenated 54-byte ping records.
pub const INDEX_FILE_NAME: &str = "sidescan-index.mra";
/// File holding the concatenated raw intensity samples.
pub const DATA_FILE_NAME: &str = "sidescan-data.mra";
/// File holding the concatenated mark records.
pub const MARKS_FILE_NAME: &str = "sidescan-marks.mra";
