//! Survey-log fixtures shared by the builder and store tests.

use std::path::Path;

use sidescan_log::schema::{self, field};
use sidescan_log::{LogMessage, MemoryLogSource};

pub const SYSTEM: u16 = 1;
pub const SONAR: u8 = 10;
pub const DVL: u8 = 20;
pub const FREQUENCY: i32 = 900_000;
pub const RANGE: i32 = 30;
pub const SAMPLES_PER_PING: usize = 100;
pub const REFERENCE_LAT_DEGS: f64 = 41.18;
pub const REFERENCE_LON_DEGS: f64 = -8.70;
pub const FIX_TIMES: [i64; 4] = [900, 1_100, 1_300, 1_500];

pub fn ping(timestamp_millis: i64, system_id: u16, entity_id: u8) -> LogMessage {
    let samples = (0..SAMPLES_PER_PING)
        .map(|i| ((i as i64 + timestamp_millis) % 256) as u8)
        .collect();
    LogMessage::new(schema::SONAR_DATA, timestamp_millis)
        .with_origin(system_id, entity_id)
        .with_integer(field::TYPE, schema::SONAR_TYPE_SIDESCAN)
        .with_integer(field::FREQUENCY, i64::from(FREQUENCY))
        .with_integer(field::RANGE, i64::from(RANGE))
        .with_integer(field::BITS_PER_POINT, 8)
        .with_raw(field::DATA, samples)
}

pub fn fix(timestamp_millis: i64) -> LogMessage {
    LogMessage::new(schema::ESTIMATED_STATE, timestamp_millis)
        .with_origin(SYSTEM, 0)
        .with_double(field::LAT, REFERENCE_LAT_DEGS.to_radians())
        .with_double(field::LON, REFERENCE_LON_DEGS.to_radians())
        .with_double(field::X, 10.0)
        .with_double(field::Y, 0.0)
        .with_double(field::PSI, std::f64::consts::FRAC_PI_2)
        .with_double(field::VX, 1.0)
        .with_double(field::VY, 0.0)
}

pub fn bottom_distance(timestamp_millis: i64, entity_id: u8, value: f64) -> LogMessage {
    LogMessage::new(schema::BOTTOM_DISTANCE, timestamp_millis)
        .with_origin(SYSTEM, entity_id)
        .with_double(field::VALUE, value)
}

/// Pings at `ping_times` from the sonar entity, fixes at [`FIX_TIMES`], and
/// 5 m DVL altitude readings alongside every fix.
pub fn survey(dir: &Path, ping_times: &[i64]) -> MemoryLogSource {
    let mut source = MemoryLogSource::new(dir)
        .with_entity(SYSTEM, SONAR, "Sidescan")
        .with_entity(SYSTEM, DVL, "DVL");
    for &ts in ping_times {
        source.push(ping(ts, SYSTEM, SONAR));
    }
    for ts in FIX_TIMES {
        source.push(fix(ts));
        source.push(bottom_distance(ts, DVL, 5.0));
    }
    source
}
