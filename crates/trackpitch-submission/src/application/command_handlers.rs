//! Command handlers for the submission write path.
//!
//! The store offers atomic batches only within one partition, and the two
//! views of a submission live in different partitions. The write discipline
//! is therefore: mirror write first, authoritative write + outbox event in
//! one batch second, compensate backward on failure. A crash window leaves,
//! at worst, an orphaned mirror record, never an authoritative record
//! without its outbox event.

use tracing::{debug, error};
use trackpitch_core::actor::ActorContext;
use trackpitch_core::clock::Clock;
use trackpitch_core::error::DomainError;
use trackpitch_core::lookup::{CatalogDirectory, TrackDirectory};
use trackpitch_core::store::{BatchOperation, DocumentStore, StoreError};

use crate::domain::commands::{
    CreateSubmission, SubmissionCreatedResult, SubmissionSnapshot, SubmissionStatusUpdatedResult,
    UpdateSubmissionStatus,
};
use crate::domain::entities::{decode_document, ArtistInbox, OutboxEvent, Submission};

/// Handles `CreateSubmission`: validates the track and catalog slot against
/// the external directories, writes the inbox mirror, then atomically
/// writes the authoritative submission plus its outbox event. If the
/// atomic batch fails, the already-written inbox entry is deleted again.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if either lookup fails (nothing is
/// written in that case), or the store error if a write fails.
pub async fn handle_create_submission(
    command: &CreateSubmission,
    actor: &ActorContext,
    clock: &dyn Clock,
    store: &dyn DocumentStore,
    tracks: &dyn TrackDirectory,
    catalog: &dyn CatalogDirectory,
) -> Result<SubmissionCreatedResult, DomainError> {
    let now = clock.now();
    let artist_id = actor.actor_id;

    let track = tracks
        .track_by_id(command.track_id, artist_id)
        .await
        .map_err(|e| DomainError::NotFound {
            status: 404,
            title: "Track not found",
            message: "The specified track could not be retrieved. \
                      Please verify the track ID or try again later.",
            detail: format!(
                "failed to fetch track {} for artist {artist_id}: {e}",
                command.track_id
            ),
        })?;

    let catalog_item = catalog
        .catalog_item_by_id(command.catalog_item_id, command.curator_user_id)
        .await
        .map_err(|e| DomainError::NotFound {
            status: 404,
            title: "Catalog item not found",
            message: "The specified catalog item could not be retrieved. \
                      Please verify the catalog ID or try again later.",
            detail: format!(
                "failed to fetch catalog item {} for curator {}: {e}",
                command.catalog_item_id, command.curator_user_id
            ),
        })?;

    let submission = Submission::new(
        artist_id,
        command.curator_user_id,
        command.catalog_item_id,
        command.track_id,
        now,
    );
    let inbox = ArtistInbox::mirror_of(&submission);
    let outbox = OutboxEvent::submission_created(&submission, actor.correlation_id)?;

    store
        .create(&inbox.partition_key(), inbox.to_document()?)
        .await?;

    let batch = vec![
        BatchOperation::Create(submission.to_document()?),
        BatchOperation::Create(outbox.to_document()?),
    ];
    if let Err(batch_error) = store
        .execute_batch(&submission.partition_key(), batch)
        .await
    {
        // Undo step one so no inbox entry outlives a failed authoritative
        // write. If the delete itself fails the entry is orphaned; an
        // out-of-band reconciliation has to pick it up.
        if let Err(delete_error) = store.delete(&inbox.partition_key(), inbox.id).await {
            error!(
                submission_id = %submission.id,
                artist_id = %artist_id,
                error = %delete_error,
                "compensating inbox delete failed, inbox entry orphaned"
            );
        }
        return Err(batch_error.into());
    }

    Ok(SubmissionCreatedResult {
        submission_id: submission.id,
        artist_user_id: artist_id,
        curator_user_id: command.curator_user_id,
        snapshot: SubmissionSnapshot {
            status: submission.status,
            track_id: submission.track_id,
            catalog_item_id: submission.catalog_item_id,
            created_at: submission.created_at,
            catalog_name: catalog_item.name,
            track_name: track.title,
        },
    })
}

/// Handles `UpdateSubmissionStatus`: loads both views, applies the
/// transition to each, and persists inbox first, then the authoritative
/// replace plus outbox event in one atomic batch.
///
/// Same-status transitions are idempotent no-ops with zero writes. A
/// missing view (soft not-found) also yields a no-op result. A batch
/// concurrency conflict is tolerated without retry: another writer won the
/// race, the caller still gets the attempted old/new pair back.
///
/// # Errors
///
/// Propagates hard fetch errors, inbox write failures, and non-conflict
/// batch failures.
pub async fn handle_update_submission_status(
    command: &UpdateSubmissionStatus,
    actor: &ActorContext,
    clock: &dyn Clock,
    store: &dyn DocumentStore,
) -> Result<SubmissionStatusUpdatedResult, DomainError> {
    let curator_user_id = actor.actor_id;
    let submission_partition = Submission::partition(curator_user_id, command.catalog_item_id);
    let inbox_partition = ArtistInbox::partition(command.artist_id);

    let submission_doc = store
        .read(&submission_partition, command.submission_id)
        .await?;
    let inbox_doc = store.read(&inbox_partition, command.submission_id).await?;

    let no_op = |status| SubmissionStatusUpdatedResult {
        submission_id: command.submission_id,
        artist_user_id: command.artist_id,
        curator_user_id,
        old_status: status,
        new_status: command.new_status,
    };

    // Either view missing means there is nothing to transition.
    let (Some(submission_doc), Some(inbox_doc)) = (submission_doc, inbox_doc) else {
        return Ok(no_op(command.new_status));
    };

    let mut submission: Submission = decode_document(&submission_doc)?;
    let mut inbox: ArtistInbox = decode_document(&inbox_doc)?;

    let old_status = submission.status;
    if old_status == command.new_status {
        return Ok(no_op(old_status));
    }

    let now = clock.now();
    submission.update_status(command.new_status, now);
    inbox.update_status(command.new_status, now);

    let outbox = OutboxEvent::status_changed(&submission, old_status, actor.correlation_id)?;

    store
        .replace(&inbox_partition, inbox.to_document()?, &inbox_doc.etag)
        .await?;

    let batch = vec![
        BatchOperation::Replace {
            document: submission.to_document()?,
            if_match: submission_doc.etag,
        },
        BatchOperation::Create(outbox.to_document()?),
    ];
    match store.execute_batch(&submission_partition, batch).await {
        Ok(()) => {}
        // Another writer changed the submission first. Last write may
        // lose on this low-contention path; the caller is not blocked.
        Err(StoreError::Conflict) => {
            debug!(
                submission_id = %command.submission_id,
                "status batch lost a concurrency race, not retrying"
            );
        }
        Err(other) => return Err(other.into()),
    }

    Ok(SubmissionStatusUpdatedResult {
        submission_id: command.submission_id,
        artist_user_id: command.artist_id,
        curator_user_id,
        old_status,
        new_status: command.new_status,
    })
}
