//! On-disk sidescan ping index.
//!
//! [`IndexBuilder`] turns a survey log into two files: a fixed-width
//! record index and a raw sample blob. [`SidescanStore`] serves them back
//! with timestamp/ordinal lookups and zero-copy sample slices, and owns the
//! marks sub-store.

pub mod builder;
pub mod config;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{IndexBuildReport, IndexBuilder};
pub use config::{DEFAULT_ALTITUDE_SCAN_LIMIT, DEFAULT_SPEED_CORRECTION, IndexConfig};
pub use store::SidescanStore;
