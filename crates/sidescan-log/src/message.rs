//! Timestamped typed messages with named fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One named field value carried by a [`LogMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Double(f64),
    Integer(i64),
    Raw(Vec<u8>),
    Text(String),
}

/// A demuxed log message: type name, origin, time, and fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Message type abbreviation (`SonarData`, `EstimatedState`, ...).
    pub abbrev: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
    /// Originating system identifier.
    pub system_id: u16,
    /// Originating entity identifier within the system.
    pub entity_id: u8,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogMessage {
    #[must_use]
    pub fn new(abbrev: impl Into<String>, timestamp_millis: i64) -> Self {
        Self {
            abbrev: abbrev.into(),
            timestamp_millis,
            system_id: 0,
            entity_id: 0,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_origin(mut self, system_id: u16, entity_id: u8) -> Self {
        self.system_id = system_id;
        self.entity_id = entity_id;
        self
    }

    #[must_use]
    pub fn with_double(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fields.insert(name.into(), FieldValue::Double(value));
        self
    }

    #[must_use]
    pub fn with_integer(mut self, name: impl Into<String>, value: i64) -> Self {
        self.fields.insert(name.into(), FieldValue::Integer(value));
        self
    }

    #[must_use]
    pub fn with_raw(mut self, name: impl Into<String>, value: Vec<u8>) -> Self {
        self.fields.insert(name.into(), FieldValue::Raw(value));
        self
    }

    #[must_use]
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldValue::Text(value.into()));
        self
    }

    /// Numeric field as `f64`; integers are widened.
    #[must_use]
    pub fn get_double(&self, name: &str) -> Option<f64> {
        match self.fields.get(name)? {
            FieldValue::Double(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Raw(_) | FieldValue::Text(_) => None,
        }
    }

    /// Numeric field as `i64`; doubles are truncated toward zero.
    #[must_use]
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.fields.get(name)? {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Double(v) if v.is_finite() => Some(v.trunc() as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_raw_data(&self, name: &str) -> Option<&[u8]> {
        match self.fields.get(name)? {
            FieldValue::Raw(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_accessors_widen_and_truncate() {
        let msg = LogMessage::new("SonarData", 10)
            .with_integer("frequency", 900_000)
            .with_double("scale_factor", 2.75);
        assert_eq!(msg.get_double("frequency"), Some(900_000.0));
        assert_eq!(msg.get_integer("scale_factor"), Some(2));
        assert_eq!(msg.get_integer("missing"), None);
    }

    #[test]
    fn test_typed_accessors_reject_other_kinds() {
        let msg = LogMessage::new("SonarData", 10)
            .with_raw("data", vec![1, 2, 3])
            .with_text("label", "port");
        assert_eq!(msg.get_raw_data("data"), Some(&[1_u8, 2, 3][..]));
        assert_eq!(msg.get_double("data"), None);
        assert_eq!(msg.get_raw_data("label"), None);
        assert_eq!(msg.get_text("label"), Some("port"));
        assert!(msg.has_field("data"));
    }

    #[test]
    fn test_integer_rejects_non_finite_double() {
        let msg = LogMessage::new("EstimatedState", 0).with_double("alt", f64::NAN);
        assert_eq!(msg.get_integer("alt"), None);
    }
}
