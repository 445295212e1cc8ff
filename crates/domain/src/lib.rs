//! # spacehub-domain
//!
//! Pure domain model for the spacehub occupancy tracker.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **entity descriptions** (people, physical spaces, other objects)
//! - Define **sensed values** (latest readings attached to an entity)
//! - Define **sensors** and **markers** and how they associate with entities
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app` or the daemon.
//! Live models and event delivery live in the `app` crate.

pub mod error;
pub mod id;
pub mod time;

pub mod description;
pub mod sensed_value;
pub mod sensor;
