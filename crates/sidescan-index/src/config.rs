//! Index builder configuration.

use serde::{Deserialize, Serialize};
use sidescan_log::schema;

/// Empirical factor applied to the horizontal speed stored per ping.
pub const DEFAULT_SPEED_CORRECTION: f64 = 2.0;
/// Upper bound on bottom-distance readings scanned past the at-or-after probe.
pub const DEFAULT_ALTITUDE_SCAN_LIMIT: usize = 1024;

/// Stream names, entity names, and derived-field constants used while
/// building the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Ping stream name.
    pub ping_stream: String,
    /// Ping stream tried when `ping_stream` is absent (older logs).
    pub legacy_ping_stream: Option<String>,
    pub navigation_stream: String,
    pub bottom_distance_stream: String,
    /// Entity whose pings are indexed (compared case-insensitively).
    pub sonar_entity: String,
    /// Entity whose bottom-distance readings give the altitude.
    pub altitude_entity: String,
    pub speed_correction: f64,
    pub altitude_scan_limit: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            ping_stream: schema::SONAR_DATA.to_owned(),
            legacy_ping_stream: Some(schema::SIDESCAN_PING.to_owned()),
            navigation_stream: schema::ESTIMATED_STATE.to_owned(),
            bottom_distance_stream: schema::BOTTOM_DISTANCE.to_owned(),
            sonar_entity: "Sidescan".to_owned(),
            altitude_entity: "DVL".to_owned(),
            speed_correction: DEFAULT_SPEED_CORRECTION,
            altitude_scan_limit: DEFAULT_ALTITUDE_SCAN_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.ping_stream, "SonarData");
        assert_eq!(config.legacy_ping_stream.as_deref(), Some("SidescanPing"));
        assert_eq!(config.sonar_entity, "Sidescan");
        assert_eq!(config.altitude_entity, "DVL");
        assert_eq!(config.speed_correction, 2.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: IndexConfig = toml::from_str(
            r#"
sonar_entity = "SSS-Klein"
altitude_scan_limit = 16
"#,
        )
        .expect("parse toml");
        assert_eq!(config.sonar_entity, "SSS-Klein");
        assert_eq!(config.altitude_scan_limit, 16);
        assert_eq!(config.navigation_stream, "EstimatedState");
        assert_eq!(config.speed_correction, DEFAULT_SPEED_CORRECTION);
    }
}
