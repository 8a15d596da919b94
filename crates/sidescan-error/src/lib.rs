//! Error taxonomy shared by every sidescan crate.
//!
//! Fatal conditions surface as [`SidescanError`] values. Soft degradations
//! (missing altitude reading, unmatched entity, missing successor ping,
//! missing navigation fix) are never errors: the affected unit of work
//! yields a default value or `None` and the caller moves on.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T, E = SidescanError> = std::result::Result<T, E>;

/// Errors produced while building, loading, or reading a sidescan store.
#[derive(Debug, thiserror::Error)]
pub enum SidescanError {
    /// A stream the index builder cannot work without is absent from the log.
    #[error("required log stream '{stream}' is missing")]
    MissingRequiredStream { stream: String },

    /// The store could not be loaded or built for the given location.
    #[error("sidescan store unavailable at {}: {detail}", path.display())]
    StoreUnavailable { path: PathBuf, detail: String },

    /// Fewer bytes than a fixed-size record needs.
    #[error("truncated record: expected {expected} bytes, got {actual}")]
    TruncatedRecord { expected: usize, actual: usize },

    /// A value or slice fell outside its valid bounds.
    #[error("{what} out of range: {value}")]
    OutOfRange { what: String, value: String },

    /// On-disk bytes decode to something that cannot be valid.
    #[error("corrupt sidescan data: {detail}")]
    Corrupt { detail: String },

    /// A synthesized line cannot be geolocated.
    #[error("invalid sidescan line: {detail}")]
    InvalidLine { detail: String },

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant violation inside the library.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SidescanError {
    /// Build an [`SidescanError::Internal`] from any message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Build an [`SidescanError::Corrupt`] from any message.
    pub fn corrupt(detail: impl Into<String>) -> Self {
        Self::Corrupt {
            detail: detail.into(),
        }
    }

    /// Build an [`SidescanError::InvalidLine`] from any message.
    pub fn invalid_line(detail: impl Into<String>) -> Self {
        Self::InvalidLine {
            detail: detail.into(),
        }
    }

    /// Whether the error indicates damaged on-disk data rather than a
    /// missing input or an environmental failure.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::TruncatedRecord { .. } | Self::OutOfRange { .. } | Self::Corrupt { .. }
        )
    }
}
