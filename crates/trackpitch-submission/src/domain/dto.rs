//! Read-side projections returned by the query handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::entities::{ArtistInbox, Submission, SubmissionStatus};

/// Plain projection of a submission, shared by both views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDto {
    /// Submission identifier.
    pub id: Uuid,
    /// The artist who pitched the track.
    pub artist_id: Uuid,
    /// The curator owning the catalog slot.
    pub curator_user_id: Uuid,
    /// The catalog slot pitched to.
    pub catalog_item_id: Uuid,
    /// The pitched track.
    pub track_id: Uuid,
    /// Current lifecycle status.
    pub status: SubmissionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionDto {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            artist_id: submission.artist_id,
            curator_user_id: submission.curator_user_id,
            catalog_item_id: submission.catalog_item_id,
            track_id: submission.track_id,
            status: submission.status,
            created_at: submission.created_at,
        }
    }
}

impl From<ArtistInbox> for SubmissionDto {
    fn from(inbox: ArtistInbox) -> Self {
        Self {
            id: inbox.id,
            artist_id: inbox.artist_id,
            curator_user_id: inbox.curator_user_id,
            catalog_item_id: inbox.catalog_item_id,
            track_id: inbox.track_id,
            status: inbox.status,
            created_at: inbox.created_at,
        }
    }
}

/// Per-catalog-slot submission counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatsDto {
    /// The catalog slot the counters apply to.
    pub catalog_item_id: Uuid,
    /// All submissions for the slot.
    pub total: u32,
    /// Submissions still in `Created`.
    pub pending: u32,
    /// Submissions in `Approved`.
    pub accepted: u32,
    /// Submissions in `Rejected`.
    pub declined: u32,
    /// Submissions created since Monday 00:00 UTC of the current ISO week.
    pub this_week: u32,
    /// Submissions created since the first of the current calendar month.
    pub this_month: u32,
}
