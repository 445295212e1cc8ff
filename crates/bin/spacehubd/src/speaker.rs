//! Speaker that writes announcements to the log.

use spacehub_app::ports::Speaker;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSpeaker;

impl Speaker for TracingSpeaker {
    fn speak(&self, phrase: &str) {
        tracing::info!(target: "spacehubd::announcer", "{phrase}");
    }
}
