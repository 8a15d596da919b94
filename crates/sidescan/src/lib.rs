//! Sidescan sonar survey processing.
//!
//! Build a compact on-disk index of every ping in a survey log, serve
//! zero-copy sample slices from it, synthesize geo-referenced waterfall
//! lines, and resolve line pixels to seabed positions.
//!
//! ```no_run
//! use sidescan::{Grayscale, LineSynthesizer, MemoryLogSource, SidescanStore};
//!
//! # fn main() -> sidescan::Result<()> {
//! let log = std::fs::File::open("/data/survey/log.jsonl")?;
//! let source = MemoryLogSource::from_json_lines("/data/survey", std::io::BufReader::new(log))?;
//! let store = SidescanStore::load(&source)?;
//! let synth = LineSynthesizer::new(&store, &Grayscale);
//! for line in synth.lines_between(0, i64::MAX, 1024) {
//!     let port_edge = sidescan::locate(&line, 0.0)?;
//!     println!("{} {:?}", line.timestamp_millis, port_edge);
//! }
//! # Ok(())
//! # }
//! ```

pub use sidescan_error::{Result, SidescanError};
pub use sidescan_index::{IndexBuildReport, IndexBuilder, IndexConfig, SidescanStore};
pub use sidescan_log::{
    FieldValue, LogCursor, LogMessage, LogSource, LogStream, MemoryLogSource, MemoryLogStream,
    schema,
};
pub use sidescan_raster::{
    CalibrationParams, Colormap, Grayscale, IntensityAccumulator, InterpolatedColormap,
    LineSynthesizer, LogPingFeed, PingCursor, PingFeed, PingView, Rgb, SidescanPoint,
    SynthesisConfig, SynthesizedLine, apply_normalization_and_tvg, horizontal_distance, locate,
    locate_point, shadow_height,
};
pub use sidescan_types::{
    DATA_FILE_NAME, GeoLocation, INDEX_FILE_NAME, INDEXED_BITS_PER_POINT, MARKS_FILE_NAME, Mark,
    MarkBounds, NavigationFix, PING_RECORD_BYTES, PingRecord, decode_samples, normalized_samples,
    to_indexed_samples,
};
