//! Chronological message streams and explicit cursors over them.
//!
//! A [`LogCursor`] is a plain value: advancing it returns the message and a
//! new cursor instead of mutating shared parser state, so any number of
//! consumers can walk the same stream independently.

use std::path::{Path, PathBuf};

use crate::message::LogMessage;

/// A chronologically ordered stream of messages of one type.
pub trait LogStream {
    /// Message type carried by this stream.
    fn name(&self) -> &str;

    /// Number of messages in the stream.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Message at an ordinal position.
    fn get(&self, position: usize) -> Option<&LogMessage>;

    /// Position of the first message whose timestamp is `>= timestamp_millis`.
    fn position_at_or_after(&self, timestamp_millis: i64) -> Option<usize>;

    /// First message and a cursor on it.
    fn first_entry(&self) -> Option<(&LogMessage, LogCursor)> {
        self.get(0).map(|msg| (msg, LogCursor::at(0)))
    }

    /// First message at or after `timestamp_millis` and a cursor on it.
    fn entry_at_or_after(&self, timestamp_millis: i64) -> Option<(&LogMessage, LogCursor)> {
        let position = self.position_at_or_after(timestamp_millis)?;
        self.get(position).map(|msg| (msg, LogCursor::at(position)))
    }
}

/// Position inside a [`LogStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogCursor {
    position: usize,
}

impl LogCursor {
    #[must_use]
    pub const fn at(position: usize) -> Self {
        Self { position }
    }

    #[must_use]
    pub const fn position(self) -> usize {
        self.position
    }

    /// Message under the cursor.
    pub fn current<S: LogStream + ?Sized>(self, stream: &S) -> Option<&LogMessage> {
        stream.get(self.position)
    }

    /// Message after the cursor and a cursor on it.
    pub fn next<S: LogStream + ?Sized>(self, stream: &S) -> Option<(&LogMessage, Self)> {
        let position = self.position.checked_add(1)?;
        stream.get(position).map(|msg| (msg, Self::at(position)))
    }
}

/// A survey log: named streams, an entity-name table, and a directory for
/// derived files.
pub trait LogSource {
    /// Directory that holds the log and any files derived from it.
    fn directory(&self) -> &Path;

    /// Stream carrying messages of type `name`, when the log has one.
    fn log(&self, name: &str) -> Option<&dyn LogStream>;

    /// Path of a file named `name` inside [`LogSource::directory`], when it exists.
    fn file(&self, name: &str) -> Option<PathBuf> {
        let path = self.directory().join(name);
        path.is_file().then_some(path)
    }

    /// Human-readable name of entity `entity_id` on system `system_id`.
    fn entity_name(&self, system_id: u16, entity_id: u8) -> Option<String>;
}
