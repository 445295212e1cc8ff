//! Speaker port: outbound sink for human-readable announcements
//! (speech synthesis, a notification channel, a log line, …).

use std::sync::Arc;

/// Accepts a phrase to be announced.
pub trait Speaker: Send + Sync {
    /// Queue `phrase` for announcement. Must not block on playback.
    fn speak(&self, phrase: &str);
}

impl<T: Speaker + ?Sized> Speaker for Arc<T> {
    fn speak(&self, phrase: &str) {
        (**self).speak(phrase);
    }
}
