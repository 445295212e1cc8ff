//! Sensed value: the latest reading of one named quantity for an entity
//! (a BLE RSSI, a temperature, a door contact, …).

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, now};

/// A single reading, replaced wholesale when a newer one arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensedValue {
    pub name: String,
    pub value_type: String,
    pub value: serde_json::Value,
    pub timestamp: Timestamp,
}

impl SensedValue {
    /// Build a reading stamped with the current time.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value_type: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self::at(name, value_type, value, now())
    }

    /// Build a reading with an explicit timestamp.
    #[must_use]
    pub fn at(
        name: impl Into<String>,
        value_type: impl Into<String>,
        value: serde_json::Value,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            value,
            timestamp,
        }
    }

    /// Whether this reading was taken after `other`.
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.timestamp > other.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn should_stamp_reading_with_current_time() {
        let before = now();
        let value = SensedValue::new("rssi", "dbm", serde_json::json!(-56));
        assert!(value.timestamp >= before);
        assert_eq!(value.value, serde_json::json!(-56));
    }

    #[test]
    fn should_compare_readings_by_timestamp() {
        let ts = now();
        let older = SensedValue::at("rssi", "dbm", serde_json::json!(-70), ts);
        let newer = SensedValue::at(
            "rssi",
            "dbm",
            serde_json::json!(-50),
            ts + Duration::seconds(1),
        );
        assert!(newer.is_newer_than(&older));
        assert!(!older.is_newer_than(&newer));
    }
}
