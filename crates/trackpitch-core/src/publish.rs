//! Fire-and-forget publish sink.
//!
//! The outbox relay hands event payloads to this trait; the transport
//! behind it (message bus, webhook fan-out) is not specified here.

use thiserror::Error;

/// Failure to hand an event to the transport.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The transport rejected or dropped the event.
    #[error("publish failed: {0}")]
    Transport(String),
}

/// Sink for relayed outbox events.
#[async_trait::async_trait]
pub trait PublishSink: Send + Sync {
    /// Publishes one event payload.
    ///
    /// # Errors
    ///
    /// Returns `PublishError` if the transport rejects the event.
    async fn publish(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), PublishError>;
}
