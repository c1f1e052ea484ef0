//! Persisted entities: the dual-view submission model and the outbox event.
//!
//! `Submission` is the authoritative record, partitioned by
//! (curator, catalog item). `ArtistInbox` is a read-optimized mirror of the
//! same logical entity, partitioned by artist, and shares the submission's
//! id. `OutboxEvent` lives in the submission's partition so it can be
//! written in the same atomic batch as the state change it describes.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use trackpitch_core::error::DomainError;
use trackpitch_core::store::{NewDocument, PartitionKey, StoredDocument};
use uuid::Uuid;

use super::events::{SubmissionCreated, SubmissionStatusChanged};

/// Type discriminator for authoritative submission documents.
pub const SUBMISSION_DOC_TYPE: &str = "Submission";
/// Type discriminator for artist inbox documents.
pub const ARTIST_INBOX_DOC_TYPE: &str = "ArtistInbox";
/// Type discriminator for outbox event documents.
pub const OUTBOX_DOC_TYPE: &str = "Outbox";

/// Lifecycle status of a submission. `Created` is the sole initial state;
/// `Approved` and `Rejected` are terminal for this subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    /// Submitted, awaiting curator review.
    Created,
    /// Accepted into the catalog slot.
    Approved,
    /// Declined by the curator.
    Rejected,
}

impl SubmissionStatus {
    /// Parses a status name, case-insensitively. `None` for unknown names.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "created" => Some(Self::Created),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        };
        write!(f, "{name}")
    }
}

/// Authoritative submission record, partitioned by (curator, catalog item).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Immutable identifier, generated on creation.
    pub id: Uuid,
    /// The artist who pitched the track.
    pub artist_id: Uuid,
    /// The curator owning the catalog slot.
    pub curator_user_id: Uuid,
    /// The catalog slot being pitched to.
    pub catalog_item_id: Uuid,
    /// The pitched track.
    pub track_id: Uuid,
    /// Current lifecycle status.
    pub status: SubmissionStatus,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every status change.
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Creates a new submission in the `Created` state with a fresh id.
    #[must_use]
    pub fn new(
        artist_id: Uuid,
        curator_user_id: Uuid,
        catalog_item_id: Uuid,
        track_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            artist_id,
            curator_user_id,
            catalog_item_id,
            track_id,
            status: SubmissionStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }

    /// Partition key for submission documents of one catalog slot.
    #[must_use]
    pub fn partition(curator_user_id: Uuid, catalog_item_id: Uuid) -> PartitionKey {
        PartitionKey::new(curator_user_id.to_string()).and(catalog_item_id.to_string())
    }

    /// Partition key this submission lives under.
    #[must_use]
    pub fn partition_key(&self) -> PartitionKey {
        Self::partition(self.curator_user_id, self.catalog_item_id)
    }

    /// Applies a status transition and refreshes the update timestamp.
    pub fn update_status(&mut self, status: SubmissionStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Encodes this submission as a store document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if encoding fails.
    pub fn to_document(&self) -> Result<NewDocument, DomainError> {
        encode_document(self.id, SUBMISSION_DOC_TYPE, self)
    }
}

/// Artist-facing mirror of a submission, partitioned by artist. Shares the
/// submission's id: the mirror and the authoritative record are the same
/// logical entity in two partitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistInbox {
    /// Equals the mirrored submission's id.
    pub id: Uuid,
    /// The artist who pitched the track.
    pub artist_id: Uuid,
    /// The curator owning the catalog slot.
    pub curator_user_id: Uuid,
    /// The catalog slot being pitched to.
    pub catalog_item_id: Uuid,
    /// The pitched track.
    pub track_id: Uuid,
    /// Duplicated lifecycle status.
    pub status: SubmissionStatus,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every status change.
    pub updated_at: DateTime<Utc>,
}

impl ArtistInbox {
    /// Builds the inbox mirror for a submission.
    #[must_use]
    pub fn mirror_of(submission: &Submission) -> Self {
        Self {
            id: submission.id,
            artist_id: submission.artist_id,
            curator_user_id: submission.curator_user_id,
            catalog_item_id: submission.catalog_item_id,
            track_id: submission.track_id,
            status: submission.status,
            created_at: submission.created_at,
            updated_at: submission.updated_at,
        }
    }

    /// Partition key for one artist's inbox.
    #[must_use]
    pub fn partition(artist_id: Uuid) -> PartitionKey {
        PartitionKey::new(artist_id.to_string())
    }

    /// Partition key this inbox entry lives under.
    #[must_use]
    pub fn partition_key(&self) -> PartitionKey {
        Self::partition(self.artist_id)
    }

    /// Applies a status transition and refreshes the update timestamp.
    pub fn update_status(&mut self, status: SubmissionStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Encodes this inbox entry as a store document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if encoding fails.
    pub fn to_document(&self) -> Result<NewDocument, DomainError> {
        encode_document(self.id, ARTIST_INBOX_DOC_TYPE, self)
    }
}

/// Processing state of an outbox event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxEventState {
    /// Not yet handed to the transport.
    Pending,
    /// Successfully published by the relay.
    Published,
    /// The transport rejected the event.
    Failed,
}

/// Durable "event occurred" record, written in the same partition and
/// atomic batch as the submission change it describes. Immutable except
/// for relay bookkeeping (`state`, `published_at`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEvent {
    /// Event identifier.
    pub id: Uuid,
    /// The submission this event correlates to.
    pub submission_id: Uuid,
    /// Curator component of the partition key.
    pub curator_user_id: Uuid,
    /// Catalog component of the partition key.
    pub catalog_item_id: Uuid,
    /// The track involved.
    pub track_id: Uuid,
    /// Event type name for downstream routing.
    pub event_type: String,
    /// Opaque snapshot payload for downstream consumers.
    pub payload: serde_json::Value,
    /// Relay processing state.
    pub state: OutboxEventState,
    /// Timestamp of the described state change, for downstream ordering.
    pub created_at: DateTime<Utc>,
    /// When the relay published the event, if it has.
    pub published_at: Option<DateTime<Utc>>,
}

/// Event type name for submission creation.
pub const EVENT_SUBMISSION_CREATED: &str = "SubmissionCreated";
/// Event type name for submission status changes.
pub const EVENT_SUBMISSION_STATUS_CHANGED: &str = "SubmissionStatusChanged";

impl OutboxEvent {
    fn new(
        submission: &Submission,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            submission_id: submission.id,
            curator_user_id: submission.curator_user_id,
            catalog_item_id: submission.catalog_item_id,
            track_id: submission.track_id,
            event_type: event_type.to_owned(),
            payload,
            state: OutboxEventState::Pending,
            created_at: submission.created_at,
            published_at: None,
        }
    }

    /// Builds the outbox event for a newly created submission.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload fails to encode.
    pub fn submission_created(
        submission: &Submission,
        correlation_id: Uuid,
    ) -> Result<Self, DomainError> {
        let payload = SubmissionCreated {
            submission_id: submission.id,
            artist_id: submission.artist_id,
            curator_user_id: submission.curator_user_id,
            catalog_item_id: submission.catalog_item_id,
            track_id: submission.track_id,
            created_at: submission.created_at,
            correlation_id,
        };
        Ok(Self::new(
            submission,
            EVENT_SUBMISSION_CREATED,
            encode_payload(&payload)?,
        ))
    }

    /// Builds the outbox event for a status change, capturing the prior
    /// status.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload fails to encode.
    pub fn status_changed(
        submission: &Submission,
        old_status: SubmissionStatus,
        correlation_id: Uuid,
    ) -> Result<Self, DomainError> {
        let payload = SubmissionStatusChanged {
            submission_id: submission.id,
            old_status,
            new_status: submission.status,
            curator_user_id: submission.curator_user_id,
            changed_at: submission.updated_at,
            correlation_id,
        };
        Ok(Self::new(
            submission,
            EVENT_SUBMISSION_STATUS_CHANGED,
            encode_payload(&payload)?,
        ))
    }

    /// Marks the event as published by the relay.
    pub fn mark_published(&mut self, now: DateTime<Utc>) {
        self.state = OutboxEventState::Published;
        self.published_at = Some(now);
    }

    /// Marks the event as rejected by the transport.
    pub fn mark_failed(&mut self) {
        self.state = OutboxEventState::Failed;
    }

    /// Encodes this event as a store document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if encoding fails.
    pub fn to_document(&self) -> Result<NewDocument, DomainError> {
        encode_document(self.id, OUTBOX_DOC_TYPE, self)
    }
}

fn encode_payload<T: Serialize>(payload: &T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(payload)
        .map_err(|e| DomainError::Infrastructure(format!("payload encoding failed: {e}")))
}

fn encode_document<T: Serialize>(
    id: Uuid,
    doc_type: &str,
    entity: &T,
) -> Result<NewDocument, DomainError> {
    let body = serde_json::to_value(entity)
        .map_err(|e| DomainError::Infrastructure(format!("document encoding failed: {e}")))?;
    Ok(NewDocument {
        id,
        doc_type: doc_type.to_owned(),
        body,
    })
}

/// Decodes a stored document body into an entity.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the body does not match the
/// expected shape.
pub fn decode_document<T: DeserializeOwned>(document: &StoredDocument) -> Result<T, DomainError> {
    serde_json::from_value(document.body.clone()).map_err(|e| {
        DomainError::Infrastructure(format!(
            "document {} decoding failed: {e}",
            document.id
        ))
    })
}
