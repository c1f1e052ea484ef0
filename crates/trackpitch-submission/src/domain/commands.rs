//! Commands and their results for the submission write path.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::entities::SubmissionStatus;

/// Create a submission pitching a track to a catalog slot. The artist is
/// taken from the ambient actor context, not the command.
#[derive(Debug, Clone)]
pub struct CreateSubmission {
    /// The curator owning the target catalog slot.
    pub curator_user_id: Uuid,
    /// The catalog slot being pitched to.
    pub catalog_item_id: Uuid,
    /// The track being pitched.
    pub track_id: Uuid,
}

/// Transition a submission to a new status. The curator is taken from the
/// ambient actor context.
#[derive(Debug, Clone)]
pub struct UpdateSubmissionStatus {
    /// The submission to transition.
    pub submission_id: Uuid,
    /// The artist owning the inbox mirror.
    pub artist_id: Uuid,
    /// The catalog slot the submission belongs to.
    pub catalog_item_id: Uuid,
    /// The status to transition into.
    pub new_status: SubmissionStatus,
}

/// Denormalized "after" snapshot of a created submission, suitable for
/// notification and activity-feed consumption.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSnapshot {
    /// Status after creation (always `Created`).
    pub status: SubmissionStatus,
    /// The pitched track.
    pub track_id: Uuid,
    /// The catalog slot pitched to.
    pub catalog_item_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Human-readable catalog slot name, from the catalog lookup.
    pub catalog_name: String,
    /// Human-readable track title, from the track lookup.
    pub track_name: String,
}

/// Result of a successful `CreateSubmission`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCreatedResult {
    /// Identifier of the new submission.
    pub submission_id: Uuid,
    /// The artist who pitched.
    pub artist_user_id: Uuid,
    /// The curator owning the slot.
    pub curator_user_id: Uuid,
    /// Denormalized post-creation snapshot.
    pub snapshot: SubmissionSnapshot,
}

/// Result of an `UpdateSubmissionStatus`. When nothing existed to
/// transition, or the transition was a same-status no-op, `old_status`
/// equals `new_status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatusUpdatedResult {
    /// The affected submission.
    pub submission_id: Uuid,
    /// The artist owning the inbox mirror.
    pub artist_user_id: Uuid,
    /// The curator who applied the transition.
    pub curator_user_id: Uuid,
    /// Status before the transition.
    pub old_status: SubmissionStatus,
    /// Status after the transition.
    pub new_status: SubmissionStatus,
}
