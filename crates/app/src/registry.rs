//! Sensor registry: the catalogue of known sensed entities, sensors and
//! markers, and of which sensor watches what and which marker tags whom.
//!
//! The registry is filled once at startup (usually from a description file)
//! and is then the source the [`EntityModelCollection`](crate::model::collection::EntityModelCollection)
//! builds its models from.

use std::collections::{BTreeMap, HashMap};

use spacehub_domain::description::{EntityDescription, EntityKind};
use spacehub_domain::error::{
    InvalidReferenceError, NotFoundError, SpaceHubError, ValidationError,
};
use spacehub_domain::id::EntityId;
use spacehub_domain::sensor::{
    MarkerAssociation, MarkerDescription, SensorAssociation, SensorDescription,
};

#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensed: BTreeMap<EntityId, EntityDescription>,
    sensors: BTreeMap<EntityId, SensorDescription>,
    markers: BTreeMap<EntityId, MarkerDescription>,
    sensor_associations: Vec<SensorAssociation>,
    marker_associations: Vec<MarkerAssociation>,
    marked_by_marker_id: HashMap<String, EntityId>,
}

impl SensorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a person, space or other sensed entity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateId`] when the id is taken.
    pub fn register_sensed_entity(
        &mut self,
        description: EntityDescription,
    ) -> Result<(), SpaceHubError> {
        insert_unique(&mut self.sensed, description.id().clone(), description)
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateId`] when the id is taken.
    pub fn register_sensor(&mut self, sensor: SensorDescription) -> Result<(), SpaceHubError> {
        insert_unique(&mut self.sensors, sensor.id.clone(), sensor)
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateId`] when the id or the hardware
    /// marker id is taken.
    pub fn register_marker(&mut self, marker: MarkerDescription) -> Result<(), SpaceHubError> {
        if self
            .markers
            .values()
            .any(|known| known.marker_id == marker.marker_id)
        {
            return Err(ValidationError::DuplicateId(marker.marker_id).into());
        }
        insert_unique(&mut self.markers, marker.id.clone(), marker)
    }

    /// Record that `sensor` observes `sensed`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when either end is unknown.
    pub fn associate_sensor(
        &mut self,
        sensor: &EntityId,
        sensed: &EntityId,
    ) -> Result<(), SpaceHubError> {
        self.sensor(sensor)?;
        self.sensed_entity(sensed)?;
        self.sensor_associations.push(SensorAssociation {
            sensor: sensor.clone(),
            sensed: sensed.clone(),
        });
        Ok(())
    }

    /// Record that `marker` is carried by the person `marked`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when either end is unknown,
    /// [`SpaceHubError::InvalidReference`] when `marked` is not a person, or
    /// [`ValidationError::DuplicateId`] when `marker` is already associated.
    pub fn associate_marker(
        &mut self,
        marker: &EntityId,
        marked: &EntityId,
    ) -> Result<(), SpaceHubError> {
        let hardware_id = self.marker(marker)?.marker_id.clone();
        if self.marked_by_marker_id.contains_key(&hardware_id) {
            return Err(ValidationError::DuplicateId(marker.to_string()).into());
        }
        let kind = self.sensed_entity(marked)?.kind();
        if kind != EntityKind::Person {
            return Err(InvalidReferenceError::WrongKind {
                id: marked.to_string(),
                expected: EntityKind::Person,
                actual: kind,
            }
            .into());
        }
        self.marker_associations.push(MarkerAssociation {
            marker: marker.clone(),
            marked: marked.clone(),
        });
        self.marked_by_marker_id.insert(hardware_id, marked.clone());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no sensed entity has `id`.
    pub fn sensed_entity(&self, id: &EntityId) -> Result<&EntityDescription, SpaceHubError> {
        self.sensed
            .get(id)
            .ok_or_else(|| not_found("SensedEntity", id))
    }

    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no sensor has `id`.
    pub fn sensor(&self, id: &EntityId) -> Result<&SensorDescription, SpaceHubError> {
        self.sensors.get(id).ok_or_else(|| not_found("Sensor", id))
    }

    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no marker has `id`.
    pub fn marker(&self, id: &EntityId) -> Result<&MarkerDescription, SpaceHubError> {
        self.markers.get(id).ok_or_else(|| not_found("Marker", id))
    }

    /// The person carrying the marker the hardware reported as `marker_id`.
    #[must_use]
    pub fn markable_by_marker_id(&self, marker_id: &str) -> Option<&EntityDescription> {
        self.marked_by_marker_id
            .get(marker_id)
            .and_then(|id| self.sensed.get(id))
    }

    /// All sensed entities, ordered by id.
    pub fn sensed_entities(&self) -> impl Iterator<Item = &EntityDescription> {
        self.sensed.values()
    }

    pub fn sensors(&self) -> impl Iterator<Item = &SensorDescription> {
        self.sensors.values()
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerDescription> {
        self.markers.values()
    }

    #[must_use]
    pub fn sensor_associations(&self) -> &[SensorAssociation] {
        &self.sensor_associations
    }

    #[must_use]
    pub fn marker_associations(&self) -> &[MarkerAssociation] {
        &self.marker_associations
    }

    /// Entities observed by `sensor`, in association order.
    pub fn sensed_entities_for_sensor<'a>(
        &'a self,
        sensor: &'a EntityId,
    ) -> impl Iterator<Item = &'a EntityDescription> + 'a {
        self.sensor_associations
            .iter()
            .filter(move |association| &association.sensor == sensor)
            .filter_map(move |association| self.sensed.get(&association.sensed))
    }

    /// Hardware marker id → id of the person carrying it.
    pub(crate) fn marker_index(&self) -> impl Iterator<Item = (&str, &EntityId)> {
        self.marked_by_marker_id
            .iter()
            .map(|(marker_id, marked)| (marker_id.as_str(), marked))
    }
}

fn insert_unique<V>(
    map: &mut BTreeMap<EntityId, V>,
    id: EntityId,
    value: V,
) -> Result<(), SpaceHubError> {
    if map.contains_key(&id) {
        return Err(ValidationError::DuplicateId(id.to_string()).into());
    }
    map.insert(id, value);
    Ok(())
}

fn not_found(entity: &'static str, id: &EntityId) -> SpaceHubError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}
