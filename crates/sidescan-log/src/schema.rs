//! Message and field names of the survey log, and typed views over them.

use sidescan_types::{INDEXED_BITS_PER_POINT, NavigationFix};

use crate::message::LogMessage;

/// Ping stream of current logs.
pub const SONAR_DATA: &str = "SonarData";
/// Ping stream of older logs.
pub const SIDESCAN_PING: &str = "SidescanPing";
/// Navigation filter output.
pub const ESTIMATED_STATE: &str = "EstimatedState";
/// Seabed distance readings.
pub const BOTTOM_DISTANCE: &str = "BottomDistance";

/// `SonarData.type` value for side-scan pings.
pub const SONAR_TYPE_SIDESCAN: i64 = 0;

pub mod field {
    pub const TYPE: &str = "type";
    pub const FREQUENCY: &str = "frequency";
    pub const RANGE: &str = "range";
    pub const MAX_RANGE: &str = "max_range";
    pub const BITS_PER_POINT: &str = "bits_per_point";
    pub const SCALE_FACTOR: &str = "scale_factor";
    pub const DATA: &str = "data";

    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const Z: &str = "z";
    pub const DEPTH: &str = "depth";
    pub const ALT: &str = "alt";
    pub const PSI: &str = "psi";
    pub const VX: &str = "vx";
    pub const VY: &str = "vy";
    pub const U: &str = "u";

    pub const VALUE: &str = "value";
}

/// Build a [`NavigationFix`] from an `EstimatedState`-shaped message.
///
/// Missing numeric fields read as zero. Depth comes from `depth` when
/// present, `z` otherwise. Negative altitudes (the "unknown" sentinel)
/// read as zero.
#[must_use]
pub fn navigation_fix(msg: &LogMessage) -> NavigationFix {
    let get = |name: &str| msg.get_double(name).unwrap_or(0.0);
    let depth = msg
        .get_double(field::DEPTH)
        .or_else(|| msg.get_double(field::Z))
        .unwrap_or(0.0);
    NavigationFix {
        timestamp_millis: msg.timestamp_millis,
        latitude_rad: get(field::LAT),
        longitude_rad: get(field::LON),
        x: get(field::X),
        y: get(field::Y),
        depth,
        altitude: get(field::ALT).max(0.0),
        psi: get(field::PSI),
        vx: get(field::VX),
        vy: get(field::VY),
        u: get(field::U),
    }
}

/// Whether a ping message is a side-scan ping. Messages without a `type`
/// field (older ping streams) are side-scan by construction.
#[must_use]
pub fn is_sidescan_ping(msg: &LogMessage) -> bool {
    msg.get_integer(field::TYPE)
        .is_none_or(|kind| kind == SONAR_TYPE_SIDESCAN)
}

/// Acoustic range of a ping: `range`, falling back to `max_range` when zero
/// or absent.
#[must_use]
pub fn ping_range(msg: &LogMessage) -> i64 {
    match msg.get_integer(field::RANGE) {
        Some(range) if range != 0 => range,
        _ => msg.get_integer(field::MAX_RANGE).unwrap_or(0),
    }
}

/// Sample width of a ping's `data` payload. Absent means the indexed 8-bit
/// width; a value that does not fit `u32` reads as 0 so decoding rejects it.
#[must_use]
pub fn bits_per_point(msg: &LogMessage) -> u32 {
    msg.get_integer(field::BITS_PER_POINT)
        .map_or(INDEXED_BITS_PER_POINT, |bits| u32::try_from(bits).unwrap_or(0))
}
