//! Fixtures shared by unit tests across the crate.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use spacehub_domain::description::EntityDescription;
use spacehub_domain::id::CollectionId;

use crate::event_bus::{LogErrorSink, Subscriber, SubscriberError};
use crate::model::occupancy::OccupancyEvent;
use crate::model::person::PersonModel;
use crate::model::physical_space::PhysicalSpaceModel;

/// An occupancy event flattened to ids, so recorders hold no models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub space: String,
    pub entered: Vec<String>,
    pub exited: Vec<String>,
}

impl Seen {
    pub fn entered(space: &str, person: &str) -> Self {
        Self {
            space: space.to_string(),
            entered: vec![person.to_string()],
            exited: Vec::new(),
        }
    }

    pub fn exited(space: &str, person: &str) -> Self {
        Self {
            space: space.to_string(),
            entered: Vec::new(),
            exited: vec![person.to_string()],
        }
    }
}

#[derive(Default)]
pub struct OccupancyRecorder {
    seen: Mutex<Vec<Seen>>,
}

impl OccupancyRecorder {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }
}

impl Subscriber<OccupancyEvent> for OccupancyRecorder {
    fn on_next(&self, event: &OccupancyEvent) -> Result<(), SubscriberError> {
        let ids = |people: &BTreeSet<Arc<PersonModel>>| -> Vec<String> {
            people.iter().map(|p| p.id().to_string()).collect()
        };
        self.seen.lock().push(Seen {
            space: event.space().id().to_string(),
            entered: ids(event.entered()),
            exited: ids(event.exited()),
        });
        Ok(())
    }
}

pub fn space(collection: CollectionId, id: &str, name: &str) -> Arc<PhysicalSpaceModel> {
    let description = EntityDescription::physical_space()
        .id(id)
        .display_name(name)
        .build()
        .unwrap();
    PhysicalSpaceModel::new(description, collection, Arc::new(LogErrorSink))
}

pub fn person(collection: CollectionId, id: &str, name: &str) -> Arc<PersonModel> {
    let description = EntityDescription::person()
        .id(id)
        .display_name(name)
        .build()
        .unwrap();
    Arc::new(PersonModel::new(description, collection))
}
