//! # spacehub-app
//!
//! Occupancy core: live models, the event bus they publish on, and **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement (driven/outbound ports):
//!   - `ErrorSink`: where failing subscribers are reported
//!   - `Speaker`: where announcements go
//! - Provide the in-process, synchronous **event bus** (`EventBus`,
//!   `EventSource`, `Subscription`)
//! - Hold the **live models**: physical spaces and their occupants, persons,
//!   sensed objects, and the `EntityModelCollection` that owns them
//! - Translate raw sensing signals into occupancy transitions (`ModelUpdater`)
//! - Keep the `SensorRegistry` of sensors, markers and what they observe
//!
//! ## Dependency rule
//! Depends on `spacehub-domain` only (plus `parking_lot` for locks).
//! Never imports the daemon. The daemon depends on *this* crate, not the reverse.

pub mod announcer;
pub mod event_bus;
pub mod model;
pub mod ports;
pub mod registry;

#[cfg(test)]
mod test_support;
