//! Survey-log collaborator interface.
//!
//! The index builder and the line synthesizer read a demuxed message log
//! through [`LogSource`] and [`LogStream`]. Reading the vendor log format
//! is someone else's job; [`MemoryLogSource`] covers tests and logs that
//! were already demuxed into JSON lines.

pub mod memory;
pub mod message;
pub mod schema;
pub mod stream;

pub use memory::{MemoryLogSource, MemoryLogStream};
pub use message::{FieldValue, LogMessage};
pub use stream::{LogCursor, LogSource, LogStream};
