//! Live model shared by every kind of sensed entity: its description and
//! the latest reading of each sensed quantity.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use spacehub_domain::description::{EntityDescription, EntityKind};
use spacehub_domain::id::{CollectionId, EntityId};
use spacehub_domain::sensed_value::SensedValue;

pub struct SensedEntityModel {
    description: EntityDescription,
    collection: CollectionId,
    values: RwLock<HashMap<String, SensedValue>>,
}

impl SensedEntityModel {
    pub(crate) fn new(description: EntityDescription, collection: CollectionId) -> Self {
        Self {
            description,
            collection,
            values: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn description(&self) -> &EntityDescription {
        &self.description
    }

    #[must_use]
    pub fn id(&self) -> &EntityId {
        self.description.id()
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.description.kind()
    }

    /// The collection that created and owns this model.
    #[must_use]
    pub fn collection_id(&self) -> CollectionId {
        self.collection
    }

    /// Store `value` as the latest reading of its quantity.
    ///
    /// A reading older than the one already stored is dropped. Returns
    /// whether the stored reading changed.
    pub fn update_sensed_value(&self, value: SensedValue) -> bool {
        let mut values = self.values.write();
        if let Some(current) = values.get(&value.name)
            && current.is_newer_than(&value)
        {
            tracing::debug!(
                entity = %self.id(),
                value = %value.name,
                "dropping stale sensed value"
            );
            return false;
        }
        values.insert(value.name.clone(), value);
        true
    }

    #[must_use]
    pub fn sensed_value(&self, name: &str) -> Option<SensedValue> {
        self.values.read().get(name).cloned()
    }

    /// Every latest reading, ordered by quantity name.
    #[must_use]
    pub fn sensed_values(&self) -> Vec<SensedValue> {
        let mut values: Vec<SensedValue> = self.values.read().values().cloned().collect();
        values.sort_by(|a, b| a.name.cmp(&b.name));
        values
    }
}

impl fmt::Debug for SensedEntityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensedEntityModel")
            .field("id", self.id())
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}
