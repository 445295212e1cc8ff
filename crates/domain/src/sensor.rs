//! Sensors, markers and their associations with sensed entities.
//!
//! A sensor watches one or more sensed entities. A marker is something a
//! sensor can detect (a BLE beacon, an NFC tag) and identifies a person.

use serde::{Deserialize, Serialize};

use crate::error::{SpaceHubError, ValidationError};
use crate::id::EntityId;

/// A physical sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescription {
    pub id: EntityId,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

impl SensorDescription {
    /// Build a sensor description.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::Validation`] when the id or the display name is empty.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SpaceHubError> {
        let display_name = non_empty_name(display_name.into())?;
        Ok(Self {
            id: EntityId::new(id)?,
            display_name,
            description: description.into(),
        })
    }
}

/// A detectable tag carried by a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerDescription {
    pub id: EntityId,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Identifier reported by the hardware, namespaced by technology (`ble:c4:7c:8d`).
    pub marker_id: String,
}

impl MarkerDescription {
    /// Build a marker description.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::Validation`] when the id, the display name or
    /// the hardware marker id is empty.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        marker_id: impl Into<String>,
    ) -> Result<Self, SpaceHubError> {
        let display_name = non_empty_name(display_name.into())?;
        let marker_id = marker_id.into();
        if marker_id.trim().is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        Ok(Self {
            id: EntityId::new(id)?,
            display_name,
            description: description.into(),
            marker_id,
        })
    }
}

/// Links a sensor to an entity it observes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorAssociation {
    pub sensor: EntityId,
    pub sensed: EntityId,
}

/// Links a marker to the entity that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerAssociation {
    pub marker: EntityId,
    pub marked: EntityId,
}

fn non_empty_name(name: String) -> Result<String, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name)
}
