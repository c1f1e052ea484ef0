//! Outbox payload contracts consumed by downstream systems.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entities::SubmissionStatus;

/// Snapshot of a newly created submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCreated {
    /// The created submission.
    pub submission_id: Uuid,
    /// The artist who pitched the track.
    pub artist_id: Uuid,
    /// The curator owning the catalog slot.
    pub curator_user_id: Uuid,
    /// The catalog slot pitched to.
    pub catalog_item_id: Uuid,
    /// The pitched track.
    pub track_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Correlation id of the originating request.
    pub correlation_id: Uuid,
}

/// Record of a submission status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatusChanged {
    /// The affected submission.
    pub submission_id: Uuid,
    /// Status before the transition.
    pub old_status: SubmissionStatus,
    /// Status after the transition.
    pub new_status: SubmissionStatus,
    /// The curator who applied the transition.
    pub curator_user_id: Uuid,
    /// When the transition was applied.
    pub changed_at: DateTime<Utc>,
    /// Correlation id of the originating request.
    pub correlation_id: Uuid,
}
