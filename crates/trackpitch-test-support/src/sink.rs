//! Recording publish sink for relay tests.

use std::sync::Mutex;

use trackpitch_core::publish::{PublishError, PublishSink};

/// A publish sink that records every published event, or rejects all of
/// them when constructed with `failing()`.
#[derive(Debug)]
pub struct RecordingPublishSink {
    published: Mutex<Vec<(String, serde_json::Value)>>,
    fail: bool,
}

impl RecordingPublishSink {
    /// A sink that accepts and records every event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A sink that rejects every event with a transport error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns a snapshot of all (event type, payload) pairs published.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().unwrap().clone()
    }
}

impl Default for RecordingPublishSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PublishSink for RecordingPublishSink {
    async fn publish(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Transport("bus unavailable".into()));
        }
        self.published
            .lock()
            .unwrap()
            .push((event_type.to_owned(), payload.clone()));
        Ok(())
    }
}
