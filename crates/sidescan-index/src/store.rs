//! Random-access view over a built sidescan store directory.
//!
//! The index file is decoded into memory once; the sample blob is
//! memory-mapped read-only and handed out as zero-copy slices. Marks live
//! behind a reader/writer lock and are the only mutable part of a store.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use parking_lot::{RwLock, RwLockReadGuard};
use sidescan_error::{Result, SidescanError};
use sidescan_log::LogSource;
use sidescan_types::{
    DATA_FILE_NAME, INDEX_FILE_NAME, MARKS_FILE_NAME, Mark, PING_RECORD_BYTES, PingRecord,
    decode_marks, encode_marks,
};
use tracing::{debug, error, info, warn};

use crate::builder::{IndexBuilder, TEMP_SUFFIX};
use crate::config::IndexConfig;

const LOG_COMPONENT: &str = "sidescan_store";

/// A loaded sidescan store: ping records ordered by timestamp, the mapped
/// sample blob, and the marks sub-store.
pub struct SidescanStore {
    directory: PathBuf,
    records: Vec<PingRecord>,
    by_timestamp: BTreeMap<i64, usize>,
    /// `None` for an empty blob, which cannot be mapped.
    data: Option<Mmap>,
    marks: RwLock<Vec<Mark>>,
}

impl std::fmt::Debug for SidescanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SidescanStore")
            .field("directory", &self.directory)
            .field("records", &self.records.len())
            .field("data_len", &self.data_bytes().len())
            .field("marks", &self.marks.read().len())
            .finish()
    }
}

impl SidescanStore {
    /// Load the store for a survey log with the default [`IndexConfig`],
    /// building it first when the index file does not exist yet.
    pub fn load<S: LogSource + ?Sized>(source: &S) -> Result<Self> {
        Self::load_with(source, &IndexConfig::default())
    }

    /// [`SidescanStore::load`] with an explicit builder configuration.
    pub fn load_with<S: LogSource + ?Sized>(source: &S, config: &IndexConfig) -> Result<Self> {
        let dir = source.directory();
        if source.file(INDEX_FILE_NAME).is_none() {
            info!(
                component = LOG_COMPONENT,
                directory = %dir.display(),
                "no sidescan index, building one"
            );
            IndexBuilder::new(config.clone())
                .build(source)
                .map_err(|err| match err {
                    SidescanError::MissingRequiredStream { stream } => {
                        SidescanError::StoreUnavailable {
                            path: dir.to_path_buf(),
                            detail: format!("log has no '{stream}' stream"),
                        }
                    }
                    other => other,
                })?;
        }
        Self::open(dir)
    }

    /// Open an already-built store directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let index_path = dir.join(INDEX_FILE_NAME);
        let data_path = dir.join(DATA_FILE_NAME);
        for path in [&index_path, &data_path] {
            if !path.is_file() {
                return Err(SidescanError::StoreUnavailable {
                    path: dir.to_path_buf(),
                    detail: format!("missing {}", path.display()),
                });
            }
        }

        let records = read_index(&index_path)?;
        let by_timestamp = timestamp_map(&records);
        let data = map_data(&data_path)?;
        let marks = read_marks(&dir.join(MARKS_FILE_NAME));

        let store = Self {
            directory: dir.to_path_buf(),
            records,
            by_timestamp,
            data,
            marks: RwLock::new(marks),
        };
        info!(
            component = LOG_COMPONENT,
            directory = %dir.display(),
            records = store.records.len(),
            data_bytes = store.data_bytes().len(),
            marks = store.marks.read().len(),
            "sidescan store opened"
        );
        Ok(store)
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Record whose timestamp equals `timestamp_millis` exactly. When several
    /// records share a timestamp the first in timestamp order wins.
    #[must_use]
    pub fn entry_at_timestamp(&self, timestamp_millis: i64) -> Option<PingRecord> {
        let position = *self.by_timestamp.get(&timestamp_millis)?;
        self.records.get(position).copied()
    }

    /// Record at ordinal `position` in timestamp order.
    #[must_use]
    pub fn entry_at_position(&self, position: usize) -> Option<PingRecord> {
        self.records.get(position).copied()
    }

    /// First record with timestamp `>= timestamp_millis` and its position.
    #[must_use]
    pub fn entry_at_or_after(&self, timestamp_millis: i64) -> Option<(usize, PingRecord)> {
        let position = self
            .records
            .partition_point(|r| r.timestamp_millis < timestamp_millis);
        self.records.get(position).map(|r| (position, *r))
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.records.len()
    }

    /// All records in timestamp order.
    #[must_use]
    pub fn records(&self) -> &[PingRecord] {
        &self.records
    }

    /// Zero-copy slice of `record`'s samples inside the mapped blob.
    pub fn raw_samples(&self, record: &PingRecord) -> Result<&[u8]> {
        let data = self.data_bytes();
        record
            .sample_range()
            .and_then(|range| data.get(range))
            .ok_or_else(|| SidescanError::OutOfRange {
                what: "sample slice".to_owned(),
                value: format!(
                    "offset {} + {} bytes exceeds blob of {} bytes",
                    record.offset,
                    record.sample_len(),
                    data.len()
                ),
            })
    }

    /// Append a mark and rewrite the marks file.
    ///
    /// The new file is written and synced under a temporary name, then
    /// renamed over the old one, so a failed write leaves the previous
    /// marks on disk. The in-memory set is updated only when the
    /// replacement succeeds.
    pub fn add_mark(&self, mark: Mark) -> Result<()> {
        let mut marks = self.marks.write();
        marks.push(mark);
        let path = self.directory.join(MARKS_FILE_NAME);
        let written = encode_marks(&marks).and_then(|bytes| replace_file(&path, &bytes));
        if let Err(err) = written {
            marks.pop();
            warn!(
                component = LOG_COMPONENT,
                path = %path.display(),
                error = %err,
                "failed to persist marks"
            );
            return Err(err);
        }
        debug!(
            component = LOG_COMPONENT,
            path = %path.display(),
            marks = marks.len(),
            "marks persisted"
        );
        Ok(())
    }

    /// Read guard over the current marks.
    ///
    /// The lock is not reentrant: calling [`SidescanStore::add_mark`] on
    /// the same thread while the guard is alive deadlocks. Drop the guard
    /// (or clone the marks out) first.
    pub fn marks(&self) -> RwLockReadGuard<'_, Vec<Mark>> {
        self.marks.read()
    }

    fn data_bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }
}

fn read_index(path: &Path) -> Result<Vec<PingRecord>> {
    let bytes = fs::read(path)?;
    let chunks = bytes.chunks_exact(PING_RECORD_BYTES);
    if !chunks.remainder().is_empty() {
        warn!(
            component = LOG_COMPONENT,
            path = %path.display(),
            trailing_bytes = chunks.remainder().len(),
            "ignoring partial trailing index record"
        );
    }

    let mut records = Vec::with_capacity(bytes.len() / PING_RECORD_BYTES);
    for (position, chunk) in chunks.enumerate() {
        match PingRecord::decode(chunk) {
            Ok(record) => records.push(record),
            Err(err) => {
                error!(
                    component = LOG_COMPONENT,
                    path = %path.display(),
                    position,
                    error = %err,
                    "corrupt index record"
                );
                return Err(err);
            }
        }
    }
    // Stable: records sharing a timestamp keep their insertion order.
    records.sort_by_key(|r| r.timestamp_millis);
    Ok(records)
}

fn timestamp_map(records: &[PingRecord]) -> BTreeMap<i64, usize> {
    let mut map = BTreeMap::new();
    for (position, record) in records.iter().enumerate() {
        map.entry(record.timestamp_millis).or_insert(position);
    }
    map
}

fn map_data(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    #[allow(unsafe_code)] // Mmap::map requires unsafe for memory-mapped I/O.
    let map = unsafe { Mmap::map(&file)? };
    Ok(Some(map))
}

/// Write `bytes` to a temporary sibling of `path`, sync it, and rename it
/// into place. The temporary file is removed on failure.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(TEMP_SUFFIX);
    let tmp = PathBuf::from(tmp_name);

    let written = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));
    if let Err(err) = written {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            if cleanup.kind() != ErrorKind::NotFound {
                debug!(
                    component = LOG_COMPONENT,
                    path = %tmp.display(),
                    error = %cleanup,
                    "temporary marks file left behind"
                );
            }
        }
        return Err(err.into());
    }
    Ok(())
}

/// Best-effort: a missing or unreadable marks file yields an empty set.
fn read_marks(path: &Path) -> Vec<Mark> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(component = LOG_COMPONENT, path = %path.display(), "no marks file");
            return Vec::new();
        }
        Err(err) => {
            warn!(
                component = LOG_COMPONENT,
                path = %path.display(),
                error = %err,
                "marks file unreadable, starting with no marks"
            );
            return Vec::new();
        }
    };
    match decode_marks(&bytes) {
        Ok(marks) => marks,
        Err(err) => {
            warn!(
                component = LOG_COMPONENT,
                path = %path.display(),
                error = %err,
                "marks file corrupt, starting with no marks"
            );
            Vec::new()
        }
    }
}
