//! One-pass index construction from a survey log.
//!
//! The builder walks the ping stream once, pairs every accepted ping with
//! the navigation fix and bottom-distance reading at or after its
//! timestamp, and appends the ping's samples to the data blob and its
//! 54-byte record to the index. Both files are written under temporary
//! names and renamed into place (data first, index last) only after a full
//! successful pass; the index file's presence is what marks a store valid.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sidescan_error::{Result, SidescanError};
use sidescan_log::schema::{self, field};
use sidescan_log::{LogMessage, LogSource, LogStream};
use sidescan_types::{DATA_FILE_NAME, INDEX_FILE_NAME, PingRecord, to_indexed_samples};
use tracing::{debug, info, warn};

use crate::config::IndexConfig;

const LOG_COMPONENT: &str = "index_builder";
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Counters describing one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexBuildReport {
    pub records_written: usize,
    pub sample_bytes_written: u64,
    /// Pings from an entity other than the configured sonar.
    pub skipped_entity: usize,
    /// Pings whose `type` field is not side-scan.
    pub skipped_type: usize,
    /// Pings with more sample bytes than a record can describe.
    pub skipped_oversize: usize,
    /// Pings whose `bits_per_point` cannot be requantized to 8 bits.
    pub skipped_sample_format: usize,
    /// Pings with no sample payload.
    pub skipped_empty: usize,
    /// Accepted pings written with altitude 0.
    pub missing_altitude: usize,
    /// Whether the scan stopped because navigation ran out before the pings did.
    pub stopped_at_navigation_tail: bool,
}

/// Streams resolved from the log for one build.
struct BuildStreams<'a> {
    pings: &'a dyn LogStream,
    navigation: &'a dyn LogStream,
    bottom: Option<&'a dyn LogStream>,
}

/// Temporary output files, removed on drop unless committed.
struct PendingFiles {
    data_tmp: PathBuf,
    index_tmp: PathBuf,
    committed: bool,
}

impl PendingFiles {
    fn new(dir: &Path) -> Self {
        Self {
            data_tmp: dir.join(format!("{DATA_FILE_NAME}{TEMP_SUFFIX}")),
            index_tmp: dir.join(format!("{INDEX_FILE_NAME}{TEMP_SUFFIX}")),
            committed: false,
        }
    }

    fn commit(mut self, dir: &Path) -> Result<()> {
        fs::rename(&self.data_tmp, dir.join(DATA_FILE_NAME))?;
        fs::rename(&self.index_tmp, dir.join(INDEX_FILE_NAME))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingFiles {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for path in [&self.data_tmp, &self.index_tmp] {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        component = LOG_COMPONENT,
                        path = %path.display(),
                        error = %err,
                        "failed to remove temporary index file"
                    );
                }
            }
        }
    }
}

/// Builds `sidescan-index.mra` and `sidescan-data.mra` from a log source.
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    config: IndexConfig,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Build both store files inside `source.directory()`.
    ///
    /// Fails with [`SidescanError::MissingRequiredStream`] when the log has
    /// no ping or no navigation stream; the bottom-distance stream is
    /// optional. On any failure no store file is left behind.
    pub fn build<S: LogSource + ?Sized>(&self, source: &S) -> Result<IndexBuildReport> {
        let streams = self.resolve_streams(source)?;
        let dir = source.directory();
        info!(
            component = LOG_COMPONENT,
            directory = %dir.display(),
            pings = streams.pings.len(),
            fixes = streams.navigation.len(),
            has_bottom_distance = streams.bottom.is_some(),
            "building sidescan index"
        );

        let pending = PendingFiles::new(dir);
        let mut data_out = BufWriter::new(File::create(&pending.data_tmp)?);
        let mut index_out = BufWriter::new(File::create(&pending.index_tmp)?);

        let report = self.write_records(source, &streams, &mut data_out, &mut index_out)?;

        finish_file(data_out)?;
        finish_file(index_out)?;
        pending.commit(dir)?;

        info!(
            component = LOG_COMPONENT,
            directory = %dir.display(),
            records = report.records_written,
            sample_bytes = report.sample_bytes_written,
            skipped_entity = report.skipped_entity,
            skipped_type = report.skipped_type,
            skipped_oversize = report.skipped_oversize,
            skipped_sample_format = report.skipped_sample_format,
            skipped_empty = report.skipped_empty,
            missing_altitude = report.missing_altitude,
            stopped_at_navigation_tail = report.stopped_at_navigation_tail,
            "sidescan index built"
        );
        Ok(report)
    }

    fn resolve_streams<'a, S: LogSource + ?Sized>(
        &self,
        source: &'a S,
    ) -> Result<BuildStreams<'a>> {
        let pings = source
            .log(&self.config.ping_stream)
            .or_else(|| {
                self.config
                    .legacy_ping_stream
                    .as_deref()
                    .and_then(|name| source.log(name))
            })
            .ok_or_else(|| SidescanError::MissingRequiredStream {
                stream: self.config.ping_stream.clone(),
            })?;
        let navigation = source.log(&self.config.navigation_stream).ok_or_else(|| {
            SidescanError::MissingRequiredStream {
                stream: self.config.navigation_stream.clone(),
            }
        })?;
        let bottom = source.log(&self.config.bottom_distance_stream);
        if bottom.is_none() {
            debug!(
                component = LOG_COMPONENT,
                stream = %self.config.bottom_distance_stream,
                "no bottom-distance stream, altitudes default to 0"
            );
        }
        Ok(BuildStreams {
            pings,
            navigation,
            bottom,
        })
    }

    fn write_records<S: LogSource + ?Sized>(
        &self,
        source: &S,
        streams: &BuildStreams<'_>,
        data_out: &mut impl Write,
        index_out: &mut impl Write,
    ) -> Result<IndexBuildReport> {
        let mut report = IndexBuildReport::default();
        let mut offset: u64 = 0;

        for position in 0..streams.pings.len() {
            let Some(ping) = streams.pings.get(position) else {
                break;
            };
            let ts = ping.timestamp_millis;

            if !self.is_sonar_entity(source, ping) {
                report.skipped_entity += 1;
                continue;
            }
            if !schema::is_sidescan_ping(ping) {
                report.skipped_type += 1;
                continue;
            }

            let bits_per_point = schema::bits_per_point(ping);
            let raw = ping.get_raw_data(field::DATA).unwrap_or_default();
            let samples = match to_indexed_samples(raw, bits_per_point) {
                Ok(samples) => samples,
                Err(err) => {
                    warn!(
                        component = LOG_COMPONENT,
                        timestamp_millis = ts,
                        bits_per_point,
                        error = %err,
                        "unsupported sample width, skipping ping"
                    );
                    report.skipped_sample_format += 1;
                    continue;
                }
            };
            if samples.is_empty() {
                debug!(
                    component = LOG_COMPONENT,
                    timestamp_millis = ts,
                    "ping without samples, skipping"
                );
                report.skipped_empty += 1;
                continue;
            }

            let Some((nav_msg, _)) = streams.navigation.entry_at_or_after(ts) else {
                debug!(
                    component = LOG_COMPONENT,
                    timestamp_millis = ts,
                    "no navigation fix at or after ping, stopping scan"
                );
                report.stopped_at_navigation_tail = true;
                break;
            };
            let fix = schema::navigation_fix(nav_msg);

            let Ok(sample_byte_count) = i16::try_from(samples.len()) else {
                warn!(
                    component = LOG_COMPONENT,
                    timestamp_millis = ts,
                    sample_bytes = samples.len(),
                    "ping payload too large for an index record, skipping"
                );
                report.skipped_oversize += 1;
                continue;
            };

            let altitude = match self.altitude_at(source, streams.bottom, ts) {
                Some(altitude) => altitude,
                None => {
                    report.missing_altitude += 1;
                    0.0
                }
            };

            let location = fix.absolute_location();
            let record = PingRecord {
                offset,
                timestamp_millis: ts,
                latitude_degs: location.latitude_degs,
                longitude_degs: location.longitude_degs,
                altitude: altitude as f32,
                heading_degs: fix.heading_degs() as f32,
                speed: (fix.horizontal_speed() * self.config.speed_correction) as f32,
                frequency: saturating_i32(ping.get_integer(field::FREQUENCY).unwrap_or(0)),
                range: saturating_i32(schema::ping_range(ping)),
                sample_byte_count,
            };

            data_out.write_all(&samples)?;
            index_out.write_all(&record.encode())?;
            offset += samples.len() as u64;
            report.records_written += 1;
            report.sample_bytes_written = offset;
        }

        Ok(report)
    }

    fn is_sonar_entity<S: LogSource + ?Sized>(&self, source: &S, msg: &LogMessage) -> bool {
        source
            .entity_name(msg.system_id, msg.entity_id)
            .is_some_and(|name| name.eq_ignore_ascii_case(&self.config.sonar_entity))
    }

    fn is_altitude_entity<S: LogSource + ?Sized>(&self, source: &S, msg: &LogMessage) -> bool {
        source
            .entity_name(msg.system_id, msg.entity_id)
            .is_some_and(|name| name == self.config.altitude_entity)
    }

    /// Altitude for a ping at `ts`: probe the bottom-distance reading at or
    /// after `ts`; when it comes from another entity, scan forward at most
    /// `altitude_scan_limit` readings for one from the altitude entity.
    fn altitude_at<S: LogSource + ?Sized>(
        &self,
        source: &S,
        bottom: Option<&dyn LogStream>,
        ts: i64,
    ) -> Option<f64> {
        let stream = bottom?;
        let (probe, mut cursor) = stream.entry_at_or_after(ts)?;
        if self.is_altitude_entity(source, probe) {
            return probe.get_double(field::VALUE);
        }
        for _ in 0..self.config.altitude_scan_limit {
            let (reading, next) = cursor.next(stream)?;
            if self.is_altitude_entity(source, reading) {
                return reading.get_double(field::VALUE);
            }
            cursor = next;
        }
        debug!(
            component = LOG_COMPONENT,
            timestamp_millis = ts,
            limit = self.config.altitude_scan_limit,
            "no altitude reading within scan bound"
        );
        None
    }
}

fn finish_file(out: BufWriter<File>) -> Result<()> {
    let file = out.into_inner().map_err(|err| SidescanError::Io(err.into_error()))?;
    file.sync_all()?;
    Ok(())
}

fn saturating_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
