//! Typed identifiers.
//!
//! Sensed entities, sensors and markers are named by the operator
//! (`person.alice`, `space.kitchen`) so they use the string-backed
//! [`EntityId`]. Runtime handles use UUID newtypes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_id!(
    /// Identity of an entity model collection; stamped into every model it owns.
    CollectionId
);

define_id!(
    /// Identity of a single subscription on an event bus.
    SubscriptionId
);

/// Operator-assigned identity of a sensed entity, sensor or marker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a non-empty identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] when `value` is empty or blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        let a = SubscriptionId::new();
        let b = SubscriptionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn should_reject_entity_id_when_blank() {
        assert_eq!(EntityId::new("  "), Err(ValidationError::EmptyId));
        assert_eq!("".parse::<EntityId>(), Err(ValidationError::EmptyId));
    }

    #[test]
    fn should_display_entity_id_verbatim() {
        let id = EntityId::new("person.alice").unwrap();
        assert_eq!(id.to_string(), "person.alice");
        assert_eq!(id.as_str(), "person.alice");
    }

    #[test]
    fn should_roundtrip_entity_id_through_serde_json() {
        let id = EntityId::new("space.kitchen").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"space.kitchen\"");
        let parsed: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_fail_deserializing_empty_entity_id() {
        let result = serde_json::from_str::<EntityId>("\"\"");
        assert!(result.is_err());
    }
}
