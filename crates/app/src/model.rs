//! Live models: in-memory state of sensed entities and the occupancy of
//! physical spaces.
//!
//! Every model is created by an [`EntityModelCollection`](collection::EntityModelCollection)
//! and stamped with its id; models from different collections never mix.

pub mod collection;
pub mod occupancy;
pub mod person;
pub mod physical_space;
pub mod sensed_entity;
pub mod updater;
