//! Sources of pings for line synthesis.
//!
//! Lines can be synthesized straight from the survey log ([`LogPingFeed`])
//! or from a built [`SidescanStore`]. Both expose pings by ordinal position
//! in timestamp order plus the navigation fix at or after each ping.

use sidescan_error::{Result, SidescanError};
use sidescan_index::SidescanStore;
use sidescan_log::schema::{self, field};
use sidescan_log::{LogSource, LogStream};
use sidescan_types::{INDEXED_BITS_PER_POINT, NavigationFix, PingRecord};
use tracing::warn;

const LOG_COMPONENT: &str = "ping_feed";

/// One ping as the synthesizer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingView<'a> {
    pub timestamp_millis: i64,
    pub frequency: i64,
    /// Half-swath range in meters, already falling back to the maximum range.
    pub range: f64,
    pub is_sidescan: bool,
    pub samples: &'a [u8],
    pub bits_per_point: u32,
    pub scale_factor: f64,
}

impl PingView<'_> {
    /// Side-scan ping with the requested frequency; `0` accepts any.
    #[must_use]
    pub fn matches(&self, frequency: i64) -> bool {
        self.is_sidescan && (frequency == 0 || self.frequency == frequency)
    }
}

/// Chronologically ordered pings with a navigation lookup.
pub trait PingFeed {
    fn ping_count(&self) -> usize;

    fn ping(&self, position: usize) -> Option<PingView<'_>>;

    /// Position of the first ping with timestamp `>= timestamp_millis`.
    fn position_at_or_after(&self, timestamp_millis: i64) -> Option<usize>;

    /// Navigation fix at or after the ping at `position`.
    fn navigation_at_or_after(&self, position: usize) -> Option<NavigationFix>;
}

/// Pings and navigation read directly from a survey log.
#[derive(Clone, Copy)]
pub struct LogPingFeed<'a> {
    pings: &'a dyn LogStream,
    navigation: &'a dyn LogStream,
}

impl<'a> LogPingFeed<'a> {
    /// Resolve `SonarData` (or `SidescanPing` on older logs) and
    /// `EstimatedState` from `source`.
    pub fn new<S: LogSource + ?Sized>(source: &'a S) -> Result<Self> {
        let pings = source
            .log(schema::SONAR_DATA)
            .or_else(|| source.log(schema::SIDESCAN_PING))
            .ok_or_else(|| SidescanError::MissingRequiredStream {
                stream: schema::SONAR_DATA.to_owned(),
            })?;
        let navigation = source.log(schema::ESTIMATED_STATE).ok_or_else(|| {
            SidescanError::MissingRequiredStream {
                stream: schema::ESTIMATED_STATE.to_owned(),
            }
        })?;
        Ok(Self::from_streams(pings, navigation))
    }

    #[must_use]
    pub fn from_streams(pings: &'a dyn LogStream, navigation: &'a dyn LogStream) -> Self {
        Self { pings, navigation }
    }
}

impl PingFeed for LogPingFeed<'_> {
    fn ping_count(&self) -> usize {
        self.pings.len()
    }

    fn ping(&self, position: usize) -> Option<PingView<'_>> {
        let msg = self.pings.get(position)?;
        Some(PingView {
            timestamp_millis: msg.timestamp_millis,
            frequency: msg.get_integer(field::FREQUENCY).unwrap_or(0),
            range: schema::ping_range(msg) as f64,
            is_sidescan: schema::is_sidescan_ping(msg),
            samples: msg.get_raw_data(field::DATA).unwrap_or_default(),
            bits_per_point: schema::bits_per_point(msg),
            scale_factor: msg.get_double(field::SCALE_FACTOR).unwrap_or(1.0),
        })
    }

    fn position_at_or_after(&self, timestamp_millis: i64) -> Option<usize> {
        self.pings.position_at_or_after(timestamp_millis)
    }

    fn navigation_at_or_after(&self, position: usize) -> Option<NavigationFix> {
        let ping = self.pings.get(position)?;
        let (msg, _) = self.navigation.entry_at_or_after(ping.timestamp_millis)?;
        Some(schema::navigation_fix(msg))
    }
}

/// Navigation state recorded in an index record.
///
/// The record's absolute position becomes the reference with no local
/// offset, and its stored speed is reported as forward speed.
#[must_use]
pub fn record_fix(record: &PingRecord) -> NavigationFix {
    NavigationFix {
        timestamp_millis: record.timestamp_millis,
        latitude_rad: record.latitude_degs.to_radians(),
        longitude_rad: record.longitude_degs.to_radians(),
        altitude: f64::from(record.altitude),
        psi: f64::from(record.heading_degs).to_radians(),
        u: f64::from(record.speed),
        ..NavigationFix::default()
    }
}

impl PingFeed for SidescanStore {
    fn ping_count(&self) -> usize {
        self.entry_count()
    }

    fn ping(&self, position: usize) -> Option<PingView<'_>> {
        let record = self.entry_at_position(position)?;
        let samples = match self.raw_samples(&record) {
            Ok(samples) => samples,
            Err(err) => {
                warn!(
                    component = LOG_COMPONENT,
                    position,
                    timestamp_millis = record.timestamp_millis,
                    error = %err,
                    "ping samples unreadable"
                );
                return None;
            }
        };
        Some(PingView {
            timestamp_millis: record.timestamp_millis,
            frequency: i64::from(record.frequency),
            range: f64::from(record.range),
            is_sidescan: true,
            samples,
            bits_per_point: INDEXED_BITS_PER_POINT,
            scale_factor: 1.0,
        })
    }

    fn position_at_or_after(&self, timestamp_millis: i64) -> Option<usize> {
        self.entry_at_or_after(timestamp_millis)
            .map(|(position, _)| position)
    }

    fn navigation_at_or_after(&self, position: usize) -> Option<NavigationFix> {
        self.entry_at_position(position).map(|record| record_fix(&record))
    }
}
