//! Waterfall line synthesis.
//!
//! Each ping becomes a strip of pixels: intensities go through the
//! colormap, the strip is as tall as the distance the vehicle covered until
//! the next ping (in the ping's own across-track pixel scale), and the
//! result is rescaled isotropically to the requested width.
//!
//! Walking the ping stream uses an explicit [`PingCursor`]. The synthesizer
//! holds no position of its own, so any number of callers can walk the
//! same feed concurrently.

use serde::{Deserialize, Serialize};
use sidescan_types::{NavigationFix, decode_samples, normalized_samples};
use tracing::{debug, warn};

use crate::calibration::{CalibrationParams, IntensityAccumulator, apply_normalization_and_tvg};
use crate::colormap::{Colormap, Rgb};
use crate::feed::{PingFeed, PingView};

const LOG_COMPONENT: &str = "line_synth";

/// Pings further apart than this many seconds get a one-pixel line.
pub const DEFAULT_GAP_THRESHOLD_SECS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Frequency filter for range queries; `0` accepts any.
    pub frequency: i64,
    pub gap_threshold_secs: f64,
    /// Applied to decoded samples before colour mapping when set.
    pub calibration: Option<CalibrationParams>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            frequency: 0,
            gap_threshold_secs: DEFAULT_GAP_THRESHOLD_SECS,
            calibration: None,
        }
    }
}

/// Caller-owned position in a [`PingFeed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingCursor {
    position: usize,
    y_position: u64,
}

impl PingCursor {
    /// Feed position of the current ping.
    #[must_use]
    pub const fn position(self) -> usize {
        self.position
    }

    /// Total output height of the lines produced so far.
    #[must_use]
    pub const fn y_position(self) -> u64 {
        self.y_position
    }
}

/// One rasterized ping.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedLine {
    pub timestamp_millis: i64,
    /// Output width in pixels.
    pub width: usize,
    /// Output height in pixels, at least 1.
    pub height: usize,
    /// Height before the isotropic rescale.
    pub source_height: usize,
    /// Output rows above this line along the same cursor walk.
    pub y_position: u64,
    /// Half-swath range in meters.
    pub range: f64,
    pub frequency: i64,
    /// Number of decoded samples across the swath.
    pub sample_count: usize,
    pub fix: NavigationFix,
    /// Row-major, `width * height` pixels.
    pub pixels: Vec<Rgb>,
}

impl SynthesizedLine {
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&[Rgb]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.pixels.get(start..start + self.width)
    }

    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width {
            return None;
        }
        self.row(y).map(|row| row[x])
    }
}

/// Turns pings from a [`PingFeed`] into [`SynthesizedLine`]s.
pub struct LineSynthesizer<'a, F: PingFeed + ?Sized, C: Colormap + ?Sized> {
    feed: &'a F,
    colormap: &'a C,
    config: SynthesisConfig,
}

impl<'a, F: PingFeed + ?Sized, C: Colormap + ?Sized> LineSynthesizer<'a, F, C> {
    #[must_use]
    pub fn new(feed: &'a F, colormap: &'a C) -> Self {
        Self::with_config(feed, colormap, SynthesisConfig::default())
    }

    #[must_use]
    pub fn with_config(feed: &'a F, colormap: &'a C, config: SynthesisConfig) -> Self {
        Self {
            feed,
            colormap,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Cursor on the first ping matching `frequency` (`0` accepts any).
    #[must_use]
    pub fn start(&self, frequency: i64) -> Option<PingCursor> {
        self.cursor_from(0, frequency)
    }

    /// Cursor on the first matching ping at or after `timestamp_millis`.
    #[must_use]
    pub fn start_at(&self, timestamp_millis: i64, frequency: i64) -> Option<PingCursor> {
        let position = self.feed.position_at_or_after(timestamp_millis)?;
        self.cursor_from(position, frequency)
    }

    /// Synthesize the line for the cursor's ping and move the cursor to the
    /// next matching ping, which supplies the elapsed time.
    ///
    /// `None` when there is no next matching ping or the current ping cannot
    /// be synthesized; the caller should stop advancing.
    #[must_use]
    pub fn next_line(
        &self,
        cursor: PingCursor,
        frequency: i64,
        width: usize,
    ) -> Option<(SynthesizedLine, PingCursor)> {
        let next_position = self.find_match(cursor.position.checked_add(1)?, frequency)?;
        let line = self.synthesize(cursor.position, next_position, width, cursor.y_position)?;
        let next = PingCursor {
            position: next_position,
            y_position: cursor.y_position + line.height as u64,
        };
        Some((line, next))
    }

    /// Lines for every matching ping from the first at or after `t1` while
    /// the current ping's timestamp is `<= t2`. Stops at the first ping
    /// that yields no line, so the last ping of the window (which has no
    /// successor inside the feed) may not produce one.
    #[must_use]
    pub fn lines_between(&self, t1: i64, t2: i64, width: usize) -> Vec<SynthesizedLine> {
        let frequency = self.config.frequency;
        let mut lines = Vec::new();
        let Some(mut cursor) = self.start_at(t1, frequency) else {
            return lines;
        };
        while let Some(ping) = self.feed.ping(cursor.position) {
            if ping.timestamp_millis > t2 {
                break;
            }
            let Some((line, next)) = self.next_line(cursor, frequency, width) else {
                break;
            };
            lines.push(line);
            cursor = next;
        }
        debug!(
            component = LOG_COMPONENT,
            t1,
            t2,
            width,
            lines = lines.len(),
            "range query synthesized"
        );
        lines
    }

    /// Per-sample mean of the raw 8-bit intensities of matching pings with
    /// timestamps in `[t1, t2]`.
    #[must_use]
    pub fn mean_intensities(&self, t1: i64, t2: i64) -> IntensityAccumulator {
        let mut acc = IntensityAccumulator::new();
        let Some(start) = self.feed.position_at_or_after(t1) else {
            return acc;
        };
        for position in start..self.feed.ping_count() {
            let Some(ping) = self.feed.ping(position) else {
                continue;
            };
            if ping.timestamp_millis > t2 {
                break;
            }
            if ping.matches(self.config.frequency) {
                acc.accumulate(ping.samples);
            }
        }
        acc
    }

    fn cursor_from(&self, position: usize, frequency: i64) -> Option<PingCursor> {
        self.find_match(position, frequency).map(|position| PingCursor {
            position,
            y_position: 0,
        })
    }

    fn find_match(&self, from: usize, frequency: i64) -> Option<usize> {
        (from..self.feed.ping_count()).find(|&position| {
            self.feed
                .ping(position)
                .is_some_and(|ping| ping.matches(frequency))
        })
    }

    fn synthesize(
        &self,
        position: usize,
        next_position: usize,
        width: usize,
        y_position: u64,
    ) -> Option<SynthesizedLine> {
        let ping = self.feed.ping(position)?;
        let next = self.feed.ping(next_position)?;
        let ts = ping.timestamp_millis;

        if width == 0 {
            debug!(component = LOG_COMPONENT, timestamp_millis = ts, "zero output width");
            return None;
        }
        if !ping.range.is_finite() || ping.range <= 0.0 {
            debug!(
                component = LOG_COMPONENT,
                timestamp_millis = ts,
                range = ping.range,
                "ping without usable range"
            );
            return None;
        }
        let Some(fix) = self.feed.navigation_at_or_after(position) else {
            debug!(
                component = LOG_COMPONENT,
                timestamp_millis = ts,
                "no navigation fix at or after ping"
            );
            return None;
        };
        let intensities = self.intensities(&ping)?;
        if intensities.is_empty() {
            debug!(component = LOG_COMPONENT, timestamp_millis = ts, "ping without samples");
            return None;
        }
        let sample_count = intensities.len();

        let elapsed_secs = (next.timestamp_millis - ts) as f64 / 1000.0;
        let vertical_scale = sample_count as f64 / (2.0 * ping.range);
        let height = (elapsed_secs * fix.along_track_speed() * vertical_scale).round();
        let source_height = if height.is_nan()
            || height <= 0.0
            || elapsed_secs > self.config.gap_threshold_secs
        {
            1
        } else {
            height as usize
        };

        let colors: Vec<Rgb> = intensities
            .iter()
            .map(|&value| self.colormap.color_for(value))
            .collect();
        let line_scale = width as f64 / sample_count as f64;
        let output_height = (line_scale * source_height as f64).max(1.0).ceil() as usize;

        // Every source row is identical, so resampling one row horizontally
        // and repeating it is the nearest-neighbour result.
        let row: Vec<Rgb> = (0..width)
            .map(|x| colors[x * sample_count / width])
            .collect();
        let pixels = row.repeat(output_height);

        Some(SynthesizedLine {
            timestamp_millis: ts,
            width,
            height: output_height,
            source_height,
            y_position,
            range: ping.range,
            frequency: ping.frequency,
            sample_count,
            fix,
            pixels,
        })
    }

    fn intensities(&self, ping: &PingView<'_>) -> Option<Vec<f64>> {
        let decoded = match self.config.calibration {
            Some(params) => decode_samples(ping.samples, ping.bits_per_point, ping.scale_factor)
                .map(|data| apply_normalization_and_tvg(&data, &params)),
            None => normalized_samples(ping.samples, ping.bits_per_point),
        };
        match decoded {
            Ok(values) => Some(values),
            Err(err) => {
                warn!(
                    component = LOG_COMPONENT,
                    timestamp_millis = ping.timestamp_millis,
                    error = %err,
                    "ping samples not decodable"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sidescan_log::schema::{self, field};
    use sidescan_log::{LogMessage, MemoryLogSource};

    use super::*;
    use crate::colormap::Grayscale;
    use crate::feed::LogPingFeed;

    fn ping(ts: i64, frequency: i64, range: i64, samples: Vec<u8>) -> LogMessage {
        LogMessage::new(schema::SONAR_DATA, ts)
            .with_integer(field::TYPE, schema::SONAR_TYPE_SIDESCAN)
            .with_integer(field::FREQUENCY, frequency)
            .with_integer(field::RANGE, range)
            .with_integer(field::BITS_PER_POINT, 8)
            .with_raw(field::DATA, samples)
    }

    fn ramp() -> Vec<u8> {
        (0..100).collect()
    }

    fn fix(ts: i64, u: f64) -> LogMessage {
        LogMessage::new(schema::ESTIMATED_STATE, ts)
            .with_double(field::LAT, 0.7)
            .with_double(field::LON, -0.15)
            .with_double(field::U, u)
    }

    fn source(ping_times: &[i64], u: f64) -> MemoryLogSource {
        let mut source = MemoryLogSource::new("/tmp/survey");
        for &ts in ping_times {
            source.push(ping(ts, 900_000, 20, ramp()));
            source.push(fix(ts, u));
        }
        source
    }

    #[test]
    fn test_three_pings_yield_two_lines() {
        let source = source(&[0, 1_000, 2_000], 1.0);
        let feed = LogPingFeed::new(&source).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);

        let lines = synth.lines_between(0, 2_000, 200);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line.width, 200);
            assert!(line.height >= 1);
            assert_eq!(line.pixels.len(), line.width * line.height);
        }
        assert_eq!(lines[0].timestamp_millis, 0);
        assert_eq!(lines[1].timestamp_millis, 1_000);
        assert_eq!(lines[1].y_position, lines[0].height as u64);

        // Range queries do not disturb each other.
        assert_eq!(synth.lines_between(0, 2_000, 200), lines);
    }

    #[test]
    fn test_height_follows_distance_travelled() {
        // 0.4 s at 5 m/s over 100 samples spanning 40 m: 5 rows.
        let source = source(&[0, 400], 5.0);
        let feed = LogPingFeed::new(&source).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);
        let cursor = synth.start(0).expect("cursor");
        let (line, next) = synth.next_line(cursor, 0, 100).expect("line");
        assert_eq!(line.source_height, 5);
        assert_eq!(line.height, 5);
        assert_eq!(next.position(), 1);
        assert_eq!(next.y_position(), 5);
        assert_eq!(line.pixel(0, 0), Some(Rgb::gray(0)));
        assert_eq!(line.pixel(99, 4), Some(Rgb::gray(99)));
        assert_eq!(line.pixel(100, 0), None);
        assert!(synth.next_line(next, 0, 100).is_none());
    }

    #[test]
    fn test_rescale_to_wider_output() {
        let source = source(&[0, 400], 5.0);
        let feed = LogPingFeed::new(&source).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);
        let cursor = synth.start(0).expect("cursor");
        let (line, _) = synth.next_line(cursor, 0, 250).expect("line");
        // line_scale 2.5, 5 source rows -> 12.5 -> 13.
        assert_eq!(line.height, 13);
        assert_eq!(line.pixel(0, 12), Some(Rgb::gray(0)));
        assert_eq!(line.pixel(3, 0), Some(Rgb::gray(1)));
    }

    #[test]
    fn test_long_gap_and_zero_speed_clamp_to_one_row() {
        let gap = source(&[0, 600], 50.0);
        let feed = LogPingFeed::new(&gap).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);
        let (line, _) = synth
            .next_line(synth.start(0).expect("cursor"), 0, 100)
            .expect("line");
        assert_eq!(line.source_height, 1);

        let still = source(&[0, 400], 0.0);
        let feed = LogPingFeed::new(&still).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);
        let (line, _) = synth
            .next_line(synth.start(0).expect("cursor"), 0, 100)
            .expect("line");
        assert_eq!(line.source_height, 1);
        assert_eq!(line.height, 1);
    }

    #[test]
    fn test_frequency_filter_is_exact() {
        let mut source = MemoryLogSource::new("/tmp/survey");
        source.push(ping(0, 900_000, 20, ramp()));
        source.push(ping(100, 450_000, 20, ramp()));
        source.push(ping(200, 900_000, 20, ramp()));
        source.push(fix(300, 1.0));
        let feed = LogPingFeed::new(&source).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);

        let cursor = synth.start(900_000).expect("cursor");
        let (line, next) = synth.next_line(cursor, 900_000, 100).expect("line");
        assert_eq!(line.frequency, 900_000);
        assert_eq!(next.position(), 2);

        let (_, any) = synth.next_line(cursor, 0, 100).expect("line");
        assert_eq!(any.position(), 1);
        assert!(synth.start(12_345).is_none());
    }

    #[test]
    fn test_degenerate_pings_yield_none() {
        let mut source = MemoryLogSource::new("/tmp/survey");
        source.push(ping(0, 1, 0, ramp()));
        source.push(ping(100, 1, 20, Vec::new()));
        source.push(ping(200, 1, 20, ramp()));
        source.push(ping(300, 1, 20, ramp()));
        source.push(fix(1_000, 1.0));
        let feed = LogPingFeed::new(&source).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);

        let zero_range = synth.start(0).expect("cursor");
        assert!(synth.next_line(zero_range, 0, 100).is_none());
        let empty = synth.start_at(100, 0).expect("cursor");
        assert!(synth.next_line(empty, 0, 100).is_none());
        let good = synth.start_at(200, 0).expect("cursor");
        assert!(synth.next_line(good, 0, 0).is_none());
        assert!(synth.next_line(good, 0, 100).is_some());
    }

    #[test]
    fn test_missing_navigation_yields_none() {
        let mut source = MemoryLogSource::new("/tmp/survey");
        source.push(ping(500, 1, 20, ramp()));
        source.push(ping(600, 1, 20, ramp()));
        source.push(fix(100, 1.0));
        let feed = LogPingFeed::new(&source).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);
        assert!(synth.lines_between(0, 1_000, 100).is_empty());
    }

    #[test]
    fn test_calibrated_synthesis() {
        let source = source(&[0, 400], 5.0);
        let feed = LogPingFeed::new(&source).expect("feed");
        let config = SynthesisConfig {
            calibration: Some(CalibrationParams::default()),
            ..SynthesisConfig::default()
        };
        let synth = LineSynthesizer::with_config(&feed, &Grayscale, config);
        let (line, _) = synth
            .next_line(synth.start(0).expect("cursor"), 0, 100)
            .expect("line");
        assert_eq!(line.sample_count, 100);
        assert_eq!(line.pixels.len(), 100 * line.height);
    }

    #[test]
    fn test_mean_intensities_over_window() {
        let mut source = MemoryLogSource::new("/tmp/survey");
        source.push(ping(0, 1, 20, vec![10, 20]));
        source.push(ping(100, 1, 20, vec![30, 40]));
        source.push(ping(200, 1, 20, vec![250, 250]));
        source.push(fix(0, 1.0));
        let feed = LogPingFeed::new(&source).expect("feed");
        let synth = LineSynthesizer::new(&feed, &Grayscale);
        let acc = synth.mean_intensities(0, 100);
        assert_eq!(acc.ping_count(), 2);
        assert_eq!(acc.averages(), vec![20.0, 30.0]);
    }

    #[test]
    fn test_config_from_toml() {
        let config: SynthesisConfig = toml::from_str(
            r#"
frequency = 770000

[calibration]
tvg_gain = 120.0
"#,
        )
        .expect("parse toml");
        assert_eq!(config.frequency, 770_000);
        assert_eq!(config.gap_threshold_secs, DEFAULT_GAP_THRESHOLD_SECS);
        assert_eq!(config.calibration.map(|c| c.tvg_gain), Some(120.0));
    }

    proptest! {
        #[test]
        fn prop_lines_are_well_formed(
            gaps in proptest::collection::vec(1_i64..2_000, 1..8),
            speed in 0.0_f64..20.0,
            width in 1_usize..400,
        ) {
            let mut times = vec![0_i64];
            for gap in &gaps {
                let last = *times.last().expect("non-empty");
                times.push(last + gap);
            }
            let source = source(&times, speed);
            let feed = LogPingFeed::new(&source).expect("feed");
            let synth = LineSynthesizer::new(&feed, &Grayscale);
            let end = *times.last().expect("non-empty");
            let lines = synth.lines_between(0, end, width);
            prop_assert_eq!(lines.len(), times.len() - 1);
            let mut y = 0_u64;
            for line in &lines {
                prop_assert_eq!(line.width, width);
                prop_assert!(line.height >= 1);
                prop_assert!(line.source_height >= 1);
                prop_assert_eq!(line.pixels.len(), width * line.height);
                prop_assert_eq!(line.y_position, y);
                y += line.height as u64;
            }
        }
    }
}
