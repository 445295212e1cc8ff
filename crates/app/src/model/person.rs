//! Person model.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use spacehub_domain::description::EntityDescription;
use spacehub_domain::id::{CollectionId, EntityId};

use super::physical_space::PhysicalSpaceModel;
use super::sensed_entity::SensedEntityModel;

/// A person that can occupy physical spaces.
///
/// The space back-reference is informational and weak: the space owns the
/// membership, this only remembers where the person was last put by a
/// [`ModelUpdater`](super::updater::ModelUpdater). Equality, ordering and
/// hashing go by entity id.
pub struct PersonModel {
    entity: SensedEntityModel,
    location: Mutex<Weak<PhysicalSpaceModel>>,
}

impl PersonModel {
    pub(crate) fn new(description: EntityDescription, collection: CollectionId) -> Self {
        Self {
            entity: SensedEntityModel::new(description, collection),
            location: Mutex::new(Weak::new()),
        }
    }

    /// Description, sensed values and ownership of this person.
    #[must_use]
    pub fn entity(&self) -> &SensedEntityModel {
        &self.entity
    }

    #[must_use]
    pub fn id(&self) -> &EntityId {
        self.entity.id()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.entity.description().display_name()
    }

    /// The space this person was last recorded in, if it is still alive.
    #[must_use]
    pub fn physical_space_location(&self) -> Option<Arc<PhysicalSpaceModel>> {
        self.location.lock().upgrade()
    }

    pub(crate) fn set_physical_space_location(&self, space: &Arc<PhysicalSpaceModel>) {
        *self.location.lock() = Arc::downgrade(space);
    }

    /// Forget the location, but only when it is `space`.
    pub(crate) fn clear_physical_space_location_if(&self, space: &Arc<PhysicalSpaceModel>) -> bool {
        let mut location = self.location.lock();
        if Weak::ptr_eq(&location, &Arc::downgrade(space)) {
            *location = Weak::new();
            true
        } else {
            false
        }
    }
}

impl PartialEq for PersonModel {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for PersonModel {}

impl PartialOrd for PersonModel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PersonModel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(other.id())
    }
}

impl Hash for PersonModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for PersonModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self
            .physical_space_location()
            .map(|space| space.id().clone());
        f.debug_struct("PersonModel")
            .field("id", self.id())
            .field("location", &location)
            .finish()
    }
}
