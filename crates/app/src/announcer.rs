//! Occupancy announcer: speaks every arrival and departure.

use crate::event_bus::{Subscriber, SubscriberError};
use crate::model::occupancy::OccupancyEvent;
use crate::ports::Speaker;

/// Subscriber turning occupancy events into phrases such as
/// "Alice has entered Kitchen".
#[derive(Debug)]
pub struct OccupancyAnnouncer<S> {
    speaker: S,
}

impl<S: Speaker> OccupancyAnnouncer<S> {
    pub fn new(speaker: S) -> Self {
        Self { speaker }
    }

    /// The phrases `event` announces, arrivals first.
    #[must_use]
    pub fn phrases(event: &OccupancyEvent) -> Vec<String> {
        let space = event.space().display_name();
        let entered = event
            .entered()
            .iter()
            .map(|person| format!("{} has entered {space}", person.display_name()));
        let exited = event
            .exited()
            .iter()
            .map(|person| format!("{} has exited {space}", person.display_name()));
        entered.chain(exited).collect()
    }
}

impl<S: Speaker> Subscriber<OccupancyEvent> for OccupancyAnnouncer<S> {
    fn on_next(&self, event: &OccupancyEvent) -> Result<(), SubscriberError> {
        for phrase in Self::phrases(event) {
            self.speaker.speak(&phrase);
        }
        Ok(())
    }

    fn on_completed(&self) {
        tracing::debug!("occupancy announcer completed");
    }
}
