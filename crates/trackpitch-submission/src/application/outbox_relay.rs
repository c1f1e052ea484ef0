//! Out-of-band relay for outbox events.
//!
//! Polls pending outbox documents across partitions, hands each payload to
//! the publish sink, and marks the document published via an etag-guarded
//! replace. A replace conflict means another relay instance claimed the
//! event; the loss is harmless because downstream delivery is
//! at-least-once by contract.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use trackpitch_core::clock::Clock;
use trackpitch_core::error::DomainError;
use trackpitch_core::publish::PublishSink;
use trackpitch_core::store::{DocumentFilter, DocumentStore, Page, StoreError};

use crate::domain::entities::{decode_document, OutboxEvent, OUTBOX_DOC_TYPE};

/// Background relay draining pending outbox events to a publish sink.
pub struct OutboxRelay {
    store: Arc<dyn DocumentStore>,
    sink: Arc<dyn PublishSink>,
    clock: Arc<dyn Clock>,
    batch_size: i64,
}

impl OutboxRelay {
    /// Creates a relay draining up to `batch_size` events per pass.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sink: Arc<dyn PublishSink>,
        clock: Arc<dyn Clock>,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            sink,
            clock,
            batch_size,
        }
    }

    /// Drains one page of pending events, oldest first. Returns the number
    /// of events published on this pass.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Store` if the pending query or a non-conflict
    /// replace fails.
    pub async fn drain_pending(&self) -> Result<usize, DomainError> {
        let filter =
            DocumentFilter::of_type(OUTBOX_DOC_TYPE).field("state", serde_json::json!("Pending"));
        let page = Page {
            offset: 0,
            limit: self.batch_size,
        };
        let documents = self.store.query_all(&filter, page).await?;

        let mut published = 0;
        for document in documents {
            let Ok(mut event) = decode_document::<OutboxEvent>(&document) else {
                warn!(document_id = %document.id, "skipping undecodable outbox document");
                continue;
            };

            match self.sink.publish(&event.event_type, &event.payload).await {
                Ok(()) => event.mark_published(self.clock.now()),
                Err(e) => {
                    warn!(
                        event_id = %event.id,
                        submission_id = %event.submission_id,
                        error = %e,
                        "publish rejected, marking event failed"
                    );
                    event.mark_failed();
                }
            }

            match self
                .store
                .replace(&document.partition_key, event.to_document()?, &document.etag)
                .await
            {
                Ok(_) => {
                    if event.published_at.is_some() {
                        published += 1;
                    }
                }
                // Another relay instance got there first.
                Err(StoreError::Conflict) => {
                    debug!(event_id = %event.id, "outbox event claimed by another relay");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Ok(published)
    }

    /// Runs the relay loop until the task is cancelled, sleeping
    /// `poll_interval` between passes. Errors are logged and the loop
    /// continues.
    pub async fn run(&self, poll_interval: Duration) {
        info!(batch_size = self.batch_size, "outbox relay started");
        loop {
            match self.drain_pending().await {
                Ok(0) => {}
                Ok(count) => debug!(count, "outbox events published"),
                Err(e) => warn!(error = %e, "outbox relay pass failed"),
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
