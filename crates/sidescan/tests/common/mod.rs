//! Shared survey fixtures for the end-to-end tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Once;

use sidescan::schema::{self, field};
use sidescan::{LogMessage, MemoryLogSource};
use tracing_subscriber::EnvFilter;

pub const SYSTEM: u16 = 30;
pub const SONAR: u8 = 4;
pub const CAMERA: u8 = 5;
pub const DVL: u8 = 6;
pub const SAMPLES: usize = 100;
pub const RANGE: i64 = 20;
pub const LAT_DEGS: f64 = 38.5;
pub const LON_DEGS: f64 = -9.1;

static TRACING: Once = Once::new();

/// Route library events to the test harness; `RUST_LOG` controls the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn ping(ts: i64, entity_id: u8) -> LogMessage {
    let samples = (0..SAMPLES).map(|i| (i * 2 % 256) as u8).collect();
    LogMessage::new(schema::SONAR_DATA, ts)
        .with_origin(SYSTEM, entity_id)
        .with_integer(field::TYPE, schema::SONAR_TYPE_SIDESCAN)
        .with_integer(field::FREQUENCY, 900_000)
        .with_integer(field::RANGE, RANGE)
        .with_integer(field::BITS_PER_POINT, 8)
        .with_double(field::SCALE_FACTOR, 1.0)
        .with_raw(field::DATA, samples)
}

/// Fixed position, heading north at 1 m/s.
pub fn fix(ts: i64) -> LogMessage {
    LogMessage::new(schema::ESTIMATED_STATE, ts)
        .with_origin(SYSTEM, 0)
        .with_double(field::LAT, LAT_DEGS.to_radians())
        .with_double(field::LON, LON_DEGS.to_radians())
        .with_double(field::PSI, 0.0)
        .with_double(field::VX, 1.0)
        .with_double(field::U, 1.0)
}

pub fn altitude(ts: i64, value: f64) -> LogMessage {
    LogMessage::new(schema::BOTTOM_DISTANCE, ts)
        .with_origin(SYSTEM, DVL)
        .with_double(field::VALUE, value)
}

/// Side-scan pings at `ping_times` with a fix and an altitude reading at
/// each ping time.
pub fn survey(dir: &Path, ping_times: &[i64]) -> MemoryLogSource {
    let mut source = MemoryLogSource::new(dir)
        .with_entity(SYSTEM, SONAR, "Sidescan")
        .with_entity(SYSTEM, CAMERA, "Camera")
        .with_entity(SYSTEM, DVL, "DVL");
    for &ts in ping_times {
        source.push(ping(ts, SONAR));
        source.push(fix(ts));
        source.push(altitude(ts, 7.5));
    }
    source
}
