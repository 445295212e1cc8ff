//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the occupancy core and the outside world.
//! They are defined here (in `app`) so that both the core and the daemon
//! can depend on them without creating circular dependencies.

pub mod error_sink;
pub mod speaker;

pub use error_sink::ErrorSink;
pub use speaker::Speaker;
