//! Occupancy event: the entered/exited delta of one physical space.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::person::PersonModel;
use super::physical_space::PhysicalSpaceModel;

/// Immutable record of who entered or left a space.
///
/// Built only by the space itself, one per real transition, so exactly one
/// of [`entered`](Self::entered) and [`exited`](Self::exited) is non-empty.
#[derive(Clone)]
pub struct OccupancyEvent {
    space: Arc<PhysicalSpaceModel>,
    entered: BTreeSet<Arc<PersonModel>>,
    exited: BTreeSet<Arc<PersonModel>>,
}

impl OccupancyEvent {
    /// Name under which occupancy events are known to consumers.
    pub const NAME: &'static str = "location.occupancy";

    pub(crate) fn of_entry(space: Arc<PhysicalSpaceModel>, person: &Arc<PersonModel>) -> Self {
        Self {
            space,
            entered: BTreeSet::from([Arc::clone(person)]),
            exited: BTreeSet::new(),
        }
    }

    pub(crate) fn of_exit(space: Arc<PhysicalSpaceModel>, person: &Arc<PersonModel>) -> Self {
        Self {
            space,
            entered: BTreeSet::new(),
            exited: BTreeSet::from([Arc::clone(person)]),
        }
    }

    #[must_use]
    pub fn space(&self) -> &Arc<PhysicalSpaceModel> {
        &self.space
    }

    #[must_use]
    pub fn entered(&self) -> &BTreeSet<Arc<PersonModel>> {
        &self.entered
    }

    #[must_use]
    pub fn exited(&self) -> &BTreeSet<Arc<PersonModel>> {
        &self.exited
    }

    /// Whether this event records arrivals (as opposed to departures).
    #[must_use]
    pub fn is_entry(&self) -> bool {
        !self.entered.is_empty()
    }
}

impl fmt::Debug for OccupancyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = |people: &BTreeSet<Arc<PersonModel>>| {
            people
                .iter()
                .map(|person| person.id().to_string())
                .collect::<Vec<_>>()
        };
        f.debug_struct("OccupancyEvent")
            .field("space", self.space.id())
            .field("entered", &ids(&self.entered))
            .field("exited", &ids(&self.exited))
            .finish()
    }
}
