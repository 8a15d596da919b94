//! Waterfall rasterization of sidescan pings.
//!
//! - [`LineSynthesizer`] turns pings from a [`PingFeed`] into
//!   geo-referenced [`SynthesizedLine`]s through an injected [`Colormap`]
//! - [`geolocate`] maps line pixels back to the seabed
//! - [`calibration`] prepares raw intensities

pub mod calibration;
pub mod colormap;
pub mod feed;
pub mod geolocate;
pub mod synth;

pub use calibration::{CalibrationParams, IntensityAccumulator, apply_normalization_and_tvg};
pub use colormap::{Colormap, Grayscale, InterpolatedColormap, Rgb};
pub use feed::{LogPingFeed, PingFeed, PingView, record_fix};
pub use geolocate::{SidescanPoint, horizontal_distance, locate, locate_point, shadow_height};
pub use synth::{
    DEFAULT_GAP_THRESHOLD_SECS, LineSynthesizer, PingCursor, SynthesisConfig, SynthesizedLine,
};
