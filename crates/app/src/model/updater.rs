//! Model updater: binds one person to one space and turns a raw "sensed
//! here / gone" signal into occupancy transitions.

use std::sync::Arc;

use spacehub_domain::error::{InvalidReferenceError, SpaceHubError};

use super::person::PersonModel;
use super::physical_space::PhysicalSpaceModel;

/// Pure delegation over a (space, person) pair.
///
/// The updater is the only writer of a person's space back-reference.
#[derive(Debug, Clone)]
pub struct ModelUpdater {
    space: Arc<PhysicalSpaceModel>,
    person: Arc<PersonModel>,
}

impl ModelUpdater {
    /// Bind `person` to `space`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::InvalidReference`] when the two models come
    /// from different collections.
    pub fn new(
        space: Arc<PhysicalSpaceModel>,
        person: Arc<PersonModel>,
    ) -> Result<Self, SpaceHubError> {
        if space.entity().collection_id() != person.entity().collection_id() {
            return Err(InvalidReferenceError::ForeignModel {
                id: person.id().to_string(),
            }
            .into());
        }
        Ok(Self { space, person })
    }

    #[must_use]
    pub fn space(&self) -> &Arc<PhysicalSpaceModel> {
        &self.space
    }

    #[must_use]
    pub fn person(&self) -> &Arc<PersonModel> {
        &self.person
    }

    /// The person was sensed in the space.
    ///
    /// # Errors
    ///
    /// Propagates the error of [`PhysicalSpaceModel::occupant_entered`].
    pub fn enter_space(&self) -> Result<bool, SpaceHubError> {
        let changed = self.space.occupant_entered(&self.person)?;
        self.person.set_physical_space_location(&self.space);
        Ok(changed)
    }

    /// The person is no longer sensed in the space.
    ///
    /// The back-reference is cleared only if it still points at this space.
    ///
    /// # Errors
    ///
    /// Propagates the error of [`PhysicalSpaceModel::occupant_exited`].
    pub fn exit_space(&self) -> Result<bool, SpaceHubError> {
        let changed = self.space.occupant_exited(&self.person)?;
        self.person.clear_physical_space_location_if(&self.space);
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{OccupancyRecorder, Seen, person, space};
    use spacehub_domain::id::CollectionId;

    #[test]
    fn should_enter_space_and_point_person_at_it() {
        let collection = CollectionId::new();
        let kitchen = space(collection, "space.kitchen", "Kitchen");
        let alice = person(collection, "person.alice", "Alice");
        let recorder = Arc::new(OccupancyRecorder::default());
        kitchen.subscribe(Arc::clone(&recorder));
        let updater = ModelUpdater::new(Arc::clone(&kitchen), Arc::clone(&alice)).unwrap();

        assert!(updater.enter_space().unwrap());

        assert!(kitchen.contains(&alice));
        let location = alice.physical_space_location().unwrap();
        assert!(Arc::ptr_eq(&location, &kitchen));
        assert_eq!(
            recorder.seen(),
            vec![Seen::entered("space.kitchen", "person.alice")]
        );
    }

    #[test]
    fn should_clear_location_when_exiting_current_space() {
        let collection = CollectionId::new();
        let kitchen = space(collection, "space.kitchen", "Kitchen");
        let alice = person(collection, "person.alice", "Alice");
        let updater = ModelUpdater::new(kitchen, Arc::clone(&alice)).unwrap();

        updater.enter_space().unwrap();
        assert!(updater.exit_space().unwrap());

        assert!(alice.physical_space_location().is_none());
        assert_eq!(updater.space().occupant_count(), 0);
    }

    #[test]
    fn should_keep_newer_location_when_exiting_previous_space() {
        let collection = CollectionId::new();
        let kitchen = space(collection, "space.kitchen", "Kitchen");
        let hallway = space(collection, "space.hallway", "Hallway");
        let alice = person(collection, "person.alice", "Alice");
        let in_kitchen = ModelUpdater::new(Arc::clone(&kitchen), Arc::clone(&alice)).unwrap();
        let in_hallway = ModelUpdater::new(Arc::clone(&hallway), Arc::clone(&alice)).unwrap();

        in_kitchen.enter_space().unwrap();
        in_hallway.enter_space().unwrap();
        in_kitchen.exit_space().unwrap();

        let location = alice.physical_space_location().unwrap();
        assert!(Arc::ptr_eq(&location, &hallway));
        assert!(!kitchen.contains(&alice));
        assert!(hallway.contains(&alice));
    }

    #[test]
    fn should_not_emit_when_entering_twice_through_updater() {
        let collection = CollectionId::new();
        let kitchen = space(collection, "space.kitchen", "Kitchen");
        let recorder = Arc::new(OccupancyRecorder::default());
        kitchen.subscribe(Arc::clone(&recorder));
        let updater =
            ModelUpdater::new(kitchen, person(collection, "person.alice", "Alice")).unwrap();

        assert!(updater.enter_space().unwrap());
        assert!(!updater.enter_space().unwrap());

        assert_eq!(recorder.seen().len(), 1);
    }

    #[test]
    fn should_reject_pair_from_different_collections() {
        let kitchen = space(CollectionId::new(), "space.kitchen", "Kitchen");
        let alice = person(CollectionId::new(), "person.alice", "Alice");

        let result = ModelUpdater::new(kitchen, alice);

        assert!(matches!(result, Err(SpaceHubError::InvalidReference(_))));
    }
}
