//! # spacehubd: spacehub daemon
//!
//! Composition root that wires the occupancy core to the outside world.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Import the sensor registry description file
//! - Build the entity model collection from the registry
//! - Announce occupancy changes through a [`Speaker`](spacehub_app::ports::Speaker)
//! - Turn presence signals read line by line into occupancy transitions
//! - Tear the collection down on EOF or Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no occupancy logic belongs here.

pub mod config;
pub mod registry_file;
pub mod signal;
pub mod speaker;
