//! In-memory [`LogSource`] for tests and pre-demuxed logs.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sidescan_error::{Result, SidescanError};
use tracing::debug;

use crate::message::LogMessage;
use crate::stream::{LogSource, LogStream};

const LOG_COMPONENT: &str = "memory_log";

/// One stream of messages kept sorted by timestamp.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStream {
    name: String,
    messages: Vec<LogMessage>,
}

impl MemoryLogStream {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
        }
    }

    /// Insert `msg` after every message with a timestamp `<=` its own, so
    /// equal timestamps keep arrival order.
    pub fn push(&mut self, msg: LogMessage) {
        let at = self
            .messages
            .partition_point(|m| m.timestamp_millis <= msg.timestamp_millis);
        self.messages.insert(at, msg);
    }

    #[must_use]
    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }
}

impl LogStream for MemoryLogStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.messages.len()
    }

    fn get(&self, position: usize) -> Option<&LogMessage> {
        self.messages.get(position)
    }

    fn position_at_or_after(&self, timestamp_millis: i64) -> Option<usize> {
        let position = self
            .messages
            .partition_point(|m| m.timestamp_millis < timestamp_millis);
        (position < self.messages.len()).then_some(position)
    }
}

/// A log held entirely in memory, routed into streams by message type.
#[derive(Debug, Clone)]
pub struct MemoryLogSource {
    directory: PathBuf,
    streams: BTreeMap<String, MemoryLogStream>,
    entities: BTreeMap<(u16, u8), String>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonLine {
    Entity {
        system_id: u16,
        entity_id: u8,
        name: String,
    },
    Message(LogMessage),
}

impl MemoryLogSource {
    /// Empty log whose derived files live under `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            streams: BTreeMap::new(),
            entities: BTreeMap::new(),
        }
    }

    /// Register the name of entity `entity_id` on system `system_id`.
    #[must_use]
    pub fn with_entity(mut self, system_id: u16, entity_id: u8, name: impl Into<String>) -> Self {
        self.entities.insert((system_id, entity_id), name.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, msg: LogMessage) -> Self {
        self.push(msg);
        self
    }

    /// Route `msg` into the stream named after its type.
    pub fn push(&mut self, msg: LogMessage) {
        self.streams
            .entry(msg.abbrev.clone())
            .or_insert_with(|| MemoryLogStream::new(msg.abbrev.clone()))
            .push(msg);
    }

    /// Total number of messages across streams.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.streams.values().map(MemoryLogStream::len).sum()
    }

    /// Parse a JSON-lines log.
    ///
    /// Each non-blank line is either
    /// `{"kind":"entity","system_id":..,"entity_id":..,"name":..}` or
    /// `{"kind":"message","abbrev":..,"timestamp_millis":..,...}`.
    pub fn from_json_lines(directory: impl Into<PathBuf>, reader: impl BufRead) -> Result<Self> {
        let mut source = Self::new(directory);
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: JsonLine = serde_json::from_str(&line).map_err(|err| {
                SidescanError::corrupt(format!("log line {}: {err}", index + 1))
            })?;
            match parsed {
                JsonLine::Entity {
                    system_id,
                    entity_id,
                    name,
                } => {
                    source.entities.insert((system_id, entity_id), name);
                }
                JsonLine::Message(msg) => source.push(msg),
            }
        }
        debug!(
            component = LOG_COMPONENT,
            directory = %source.directory.display(),
            streams = source.streams.len(),
            messages = source.message_count(),
            "parsed json-lines log"
        );
        Ok(source)
    }
}

impl LogSource for MemoryLogSource {
    fn directory(&self) -> &Path {
        &self.directory
    }

    fn log(&self, name: &str) -> Option<&dyn LogStream> {
        self.streams.get(name).map(|s| s as &dyn LogStream)
    }

    fn entity_name(&self, system_id: u16, entity_id: u8) -> Option<String> {
        self.entities.get(&(system_id, entity_id)).cloned()
    }
}
