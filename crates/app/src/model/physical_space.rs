//! Physical space model: owns occupant membership and publishes the
//! occupancy deltas of one space.
//!
//! | state | call  | next | emitted |
//! |-------|-------|------|---------|
//! | out   | enter | in   | entered |
//! | in    | enter | in   | none    |
//! | in    | exit  | out  | exited  |
//! | out   | exit  | out  | none    |
//!
//! Check, mutate and emit run inside one per-space transition section, so
//! two producers racing on a first entry yield exactly one event, and
//! subscribers observe events in the order transitions were applied.
//! The occupant set has its own lock, released before subscribers run, so a
//! handler may query the space it is notified about and sees the set as the
//! transition left it. Different spaces never contend with each other.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use spacehub_domain::description::EntityDescription;
use spacehub_domain::error::{InvalidReferenceError, SpaceHubError};
use spacehub_domain::id::{CollectionId, EntityId};

use super::occupancy::OccupancyEvent;
use super::person::PersonModel;
use super::sensed_entity::SensedEntityModel;
use crate::event_bus::{EventBus, EventSource, Subscriber, Subscription};
use crate::ports::ErrorSink;

pub struct PhysicalSpaceModel {
    entity: SensedEntityModel,
    transition: Mutex<()>,
    occupants: RwLock<BTreeSet<Arc<PersonModel>>>,
    occupancy: EventBus<OccupancyEvent>,
}

impl PhysicalSpaceModel {
    pub(crate) fn new(
        description: EntityDescription,
        collection: CollectionId,
        sink: Arc<dyn ErrorSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            entity: SensedEntityModel::new(description, collection),
            transition: Mutex::new(()),
            occupants: RwLock::new(BTreeSet::new()),
            occupancy: EventBus::with_error_sink(sink),
        })
    }

    /// Description, sensed values and ownership of this space.
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

    /// Record that `person` is now in this space.
    ///
    /// Emits one entered event, before returning, when the person was not
    /// already here; otherwise does nothing. Returns whether membership
    /// changed.
    ///
    /// Subscribers run inside the transition section: a handler may read
    /// this space but must not call back into its transitions.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::InvalidReference`] when `person` belongs to
    /// another collection.
    pub fn occupant_entered(
        self: &Arc<Self>,
        person: &Arc<PersonModel>,
    ) -> Result<bool, SpaceHubError> {
        self.check_reference(person)?;
        let _transition = self.transition.lock();
        if !self.occupants.write().insert(Arc::clone(person)) {
            return Ok(false);
        }
        tracing::debug!(space = %self.id(), person = %person.id(), "occupant entered");
        self.occupancy.emit(&OccupancyEvent::of_entry(Arc::clone(self), person));
        Ok(true)
    }

    /// Record that `person` has left this space.
    ///
    /// Symmetric to [`occupant_entered`](Self::occupant_entered).
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::InvalidReference`] when `person` belongs to
    /// another collection.
    pub fn occupant_exited(
        self: &Arc<Self>,
        person: &Arc<PersonModel>,
    ) -> Result<bool, SpaceHubError> {
        self.check_reference(person)?;
        let _transition = self.transition.lock();
        if !self.occupants.write().remove(person) {
            return Ok(false);
        }
        tracing::debug!(space = %self.id(), person = %person.id(), "occupant exited");
        self.occupancy.emit(&OccupancyEvent::of_exit(Arc::clone(self), person));
        Ok(true)
    }

    /// Snapshot of the people currently here.
    #[must_use]
    pub fn occupants(&self) -> BTreeSet<Arc<PersonModel>> {
        self.occupants.read().clone()
    }

    #[must_use]
    pub fn contains(&self, person: &PersonModel) -> bool {
        self.occupants.read().contains(person)
    }

    #[must_use]
    pub fn occupant_count(&self) -> usize {
        self.occupants.read().len()
    }

    /// Subscribe-only handle on this space's occupancy events.
    #[must_use]
    pub fn occupancy(&self) -> EventSource<OccupancyEvent> {
        self.occupancy.source()
    }

    pub fn subscribe(
        &self,
        subscriber: impl Subscriber<OccupancyEvent> + 'static,
    ) -> Subscription {
        self.occupancy.subscribe(subscriber)
    }

    pub(crate) fn complete(&self) {
        self.occupancy.complete();
    }

    fn check_reference(&self, person: &PersonModel) -> Result<(), InvalidReferenceError> {
        if person.entity().collection_id() == self.entity.collection_id() {
            Ok(())
        } else {
            Err(InvalidReferenceError::ForeignModel {
                id: person.id().to_string(),
            })
        }
    }
}

impl fmt::Debug for PhysicalSpaceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occupants: Vec<String> = self
            .occupants
            .read()
            .iter()
            .map(|person| person.id().to_string())
            .collect();
        f.debug_struct("PhysicalSpaceModel")
            .field("id", self.id())
            .field("occupants", &occupants)
            .field("occupancy", &self.occupancy)
            .finish()
    }
}
