//! Query handlers for the submission read path.
//!
//! Reads degrade rather than fail: an underlying fetch error is logged as
//! a warning and converted into an empty/absent result, never propagated
//! to the caller.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use futures::StreamExt;
use tracing::warn;
use trackpitch_core::actor::{ActorContext, ActorRole};
use trackpitch_core::clock::Clock;
use trackpitch_core::store::{DocumentFilter, DocumentStore, Page, StoredDocument};
use uuid::Uuid;

use crate::domain::dto::{SubmissionDto, SubmissionStatsDto};
use crate::domain::entities::{
    decode_document, ArtistInbox, Submission, SubmissionStatus, ARTIST_INBOX_DOC_TYPE,
    SUBMISSION_DOC_TYPE,
};

/// Fetch a single submission as seen from the caller's inbox.
#[derive(Debug, Clone)]
pub struct GetSubmissionById {
    /// The catalog slot the submission belongs to (route shape; the lookup
    /// itself is keyed by id within the caller's partition).
    pub catalog_item_id: Uuid,
    /// The submission to fetch.
    pub submission_id: Uuid,
}

/// List submissions for one catalog slot of the calling curator.
#[derive(Debug, Clone)]
pub struct GetSubmissionsByCatalog {
    /// The catalog slot to list.
    pub catalog_item_id: Uuid,
    /// Optional status filter.
    pub status: Option<SubmissionStatus>,
    /// Pagination window.
    pub page: Page,
}

/// List the caller's submissions; which view is scanned depends on role.
#[derive(Debug, Clone)]
pub struct GetMySubmissions {
    /// Optional status filter.
    pub status: Option<SubmissionStatus>,
    /// Pagination window.
    pub page: Page,
}

fn decode_or_skip<T: serde::de::DeserializeOwned>(document: &StoredDocument) -> Option<T> {
    match decode_document(document) {
        Ok(entity) => Some(entity),
        Err(e) => {
            warn!(document_id = %document.id, error = %e, "skipping undecodable document");
            None
        }
    }
}

fn status_filter(doc_type: &str, status: Option<SubmissionStatus>) -> DocumentFilter {
    let filter = DocumentFilter::of_type(doc_type);
    match status {
        Some(status) => filter.field("status", serde_json::json!(status.to_string())),
        None => filter,
    }
}

/// Single-document read of the caller's inbox entry.
pub async fn get_submission_by_id(
    query: &GetSubmissionById,
    actor: &ActorContext,
    store: &dyn DocumentStore,
) -> Option<SubmissionDto> {
    let partition = ArtistInbox::partition(actor.actor_id);
    match store.read(&partition, query.submission_id).await {
        Ok(Some(document)) => decode_or_skip::<ArtistInbox>(&document).map(SubmissionDto::from),
        Ok(None) => None,
        Err(e) => {
            warn!(
                submission_id = %query.submission_id,
                catalog_item_id = %query.catalog_item_id,
                error = %e,
                "submission read failed, returning no result"
            );
            None
        }
    }
}

/// Filtered, paginated scan of one catalog slot's submissions, ordered by
/// store timestamp.
pub async fn get_submissions_by_catalog(
    query: &GetSubmissionsByCatalog,
    actor: &ActorContext,
    store: &dyn DocumentStore,
) -> Vec<SubmissionDto> {
    let partition = Submission::partition(actor.actor_id, query.catalog_item_id);
    let filter = status_filter(SUBMISSION_DOC_TYPE, query.status);
    match store.query(&partition, &filter, query.page).await {
        Ok(documents) => documents
            .iter()
            .filter_map(decode_or_skip::<Submission>)
            .map(SubmissionDto::from)
            .collect(),
        Err(e) => {
            warn!(
                catalog_item_id = %query.catalog_item_id,
                error = %e,
                "catalog query failed, returning empty result"
            );
            Vec::new()
        }
    }
}

/// Role-dependent listing: artists see their inbox, curators their
/// submissions, any other role an empty result (a deliberate default, not
/// an oversight).
pub async fn get_my_submissions(
    query: &GetMySubmissions,
    actor: &ActorContext,
    store: &dyn DocumentStore,
) -> Vec<SubmissionDto> {
    let partition_prefix = trackpitch_core::store::PartitionKey::new(actor.actor_id.to_string());
    let result = match actor.role {
        ActorRole::Artist => {
            let filter = status_filter(ARTIST_INBOX_DOC_TYPE, query.status);
            store
                .query(&partition_prefix, &filter, query.page)
                .await
                .map(|documents| {
                    documents
                        .iter()
                        .filter_map(decode_or_skip::<ArtistInbox>)
                        .map(SubmissionDto::from)
                        .collect()
                })
        }
        ActorRole::Curator => {
            let filter = status_filter(SUBMISSION_DOC_TYPE, query.status);
            store
                .query(&partition_prefix, &filter, query.page)
                .await
                .map(|documents| {
                    documents
                        .iter()
                        .filter_map(decode_or_skip::<Submission>)
                        .map(SubmissionDto::from)
                        .collect()
                })
        }
        ActorRole::Unknown => return Vec::new(),
    };
    match result {
        Ok(dtos) => dtos,
        Err(e) => {
            warn!(actor_id = %actor.actor_id, error = %e, "listing failed, returning empty result");
            Vec::new()
        }
    }
}

#[derive(Debug, Default)]
struct StatsAccumulator {
    total: u32,
    pending: u32,
    accepted: u32,
    declined: u32,
    week: u32,
    month: u32,
}

/// Full streaming scan of the user's submission partition with in-memory
/// aggregation per catalog slot. Recomputes from scratch on every call;
/// acceptable only because a partition is bounded by one curator's volume.
pub async fn get_submission_stats(
    user_id: Uuid,
    clock: &dyn Clock,
    store: &dyn DocumentStore,
) -> Vec<SubmissionStatsDto> {
    let now = clock.now();
    let week_start = start_of_iso_week(now);
    let month_start = start_of_month(now);

    let partition_prefix = trackpitch_core::store::PartitionKey::new(user_id.to_string());
    let mut accumulators: HashMap<Uuid, StatsAccumulator> = HashMap::new();

    let mut documents = store.scan(&partition_prefix);
    while let Some(item) = documents.next().await {
        let document = match item {
            Ok(document) => document,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "stats scan failed, returning empty result");
                return Vec::new();
            }
        };
        // Outbox events share the curator partition; only submissions count.
        if document.doc_type != SUBMISSION_DOC_TYPE {
            continue;
        }
        let Some(submission) = decode_or_skip::<Submission>(&document) else {
            continue;
        };

        let acc = accumulators
            .entry(submission.catalog_item_id)
            .or_default();
        acc.total += 1;
        match submission.status {
            SubmissionStatus::Created => acc.pending += 1,
            SubmissionStatus::Approved => acc.accepted += 1,
            SubmissionStatus::Rejected => acc.declined += 1,
        }
        if submission.created_at >= week_start {
            acc.week += 1;
        }
        if submission.created_at >= month_start {
            acc.month += 1;
        }
    }

    accumulators
        .into_iter()
        .map(|(catalog_item_id, acc)| SubmissionStatsDto {
            catalog_item_id,
            total: acc.total,
            pending: acc.pending,
            accepted: acc.accepted,
            declined: acc.declined,
            this_week: acc.week,
            this_month: acc.month,
        })
        .collect()
}

/// Monday 00:00 UTC of the ISO week containing `now`.
fn start_of_iso_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - chrono::Duration::days(days_from_monday);
    monday.and_time(NaiveTime::MIN).and_utc()
}

/// First of the calendar month containing `now`, 00:00 UTC.
fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .unwrap_or_else(|| now.date_naive());
    first.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trackpitch_test_support::{FixedClock, InMemoryDocumentStore};

    fn fixed_now() -> DateTime<Utc> {
        // A Wednesday; ISO week starts Monday 2026-03-09 00:00 UTC.
        Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap()
    }

    fn actor(id: Uuid, role: ActorRole) -> ActorContext {
        ActorContext::new(id, role, Uuid::new_v4())
    }

    async fn seed(
        store: &InMemoryDocumentStore,
        artist_id: Uuid,
        curator_user_id: Uuid,
        catalog_item_id: Uuid,
        status: SubmissionStatus,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let submission = Submission {
            id: Uuid::new_v4(),
            artist_id,
            curator_user_id,
            catalog_item_id,
            track_id: Uuid::new_v4(),
            status,
            created_at,
            updated_at: created_at,
        };
        let inbox = ArtistInbox::mirror_of(&submission);
        store
            .create(&submission.partition_key(), submission.to_document().unwrap())
            .await
            .unwrap();
        store
            .create(&inbox.partition_key(), inbox.to_document().unwrap())
            .await
            .unwrap();
        submission.id
    }

    fn page() -> Page {
        Page {
            offset: 0,
            limit: 50,
        }
    }

    #[tokio::test]
    async fn test_get_submission_by_id_reads_inbox_view() {
        let store = InMemoryDocumentStore::new();
        let artist_id = Uuid::new_v4();
        let catalog_item_id = Uuid::new_v4();
        let submission_id = seed(
            &store,
            artist_id,
            Uuid::new_v4(),
            catalog_item_id,
            SubmissionStatus::Created,
            fixed_now(),
        )
        .await;
        let actor = actor(artist_id, ActorRole::Artist);
        let query = GetSubmissionById {
            catalog_item_id,
            submission_id,
        };

        let dto = get_submission_by_id(&query, &actor, &store).await.unwrap();

        assert_eq!(dto.id, submission_id);
        assert_eq!(dto.artist_id, artist_id);
        assert_eq!(dto.status, SubmissionStatus::Created);
    }

    #[tokio::test]
    async fn test_get_submission_by_id_absent_returns_none() {
        let store = InMemoryDocumentStore::new();
        let actor = actor(Uuid::new_v4(), ActorRole::Artist);
        let query = GetSubmissionById {
            catalog_item_id: Uuid::new_v4(),
            submission_id: Uuid::new_v4(),
        };

        assert!(get_submission_by_id(&query, &actor, &store).await.is_none());
    }

    #[tokio::test]
    async fn test_get_submissions_by_catalog_filters_by_status() {
        let store = InMemoryDocumentStore::new();
        let curator_user_id = Uuid::new_v4();
        let catalog_item_id = Uuid::new_v4();
        seed(
            &store,
            Uuid::new_v4(),
            curator_user_id,
            catalog_item_id,
            SubmissionStatus::Created,
            fixed_now(),
        )
        .await;
        let approved_id = seed(
            &store,
            Uuid::new_v4(),
            curator_user_id,
            catalog_item_id,
            SubmissionStatus::Approved,
            fixed_now(),
        )
        .await;
        let actor = actor(curator_user_id, ActorRole::Curator);

        let all = get_submissions_by_catalog(
            &GetSubmissionsByCatalog {
                catalog_item_id,
                status: None,
                page: page(),
            },
            &actor,
            &store,
        )
        .await;
        let approved = get_submissions_by_catalog(
            &GetSubmissionsByCatalog {
                catalog_item_id,
                status: Some(SubmissionStatus::Approved),
                page: page(),
            },
            &actor,
            &store,
        )
        .await;

        assert_eq!(all.len(), 2);
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, approved_id);
    }

    #[tokio::test]
    async fn test_get_submissions_by_catalog_respects_pagination() {
        let store = InMemoryDocumentStore::new();
        let curator_user_id = Uuid::new_v4();
        let catalog_item_id = Uuid::new_v4();
        for _ in 0..5 {
            seed(
                &store,
                Uuid::new_v4(),
                curator_user_id,
                catalog_item_id,
                SubmissionStatus::Created,
                fixed_now(),
            )
            .await;
        }
        let actor = actor(curator_user_id, ActorRole::Curator);

        let window = get_submissions_by_catalog(
            &GetSubmissionsByCatalog {
                catalog_item_id,
                status: None,
                page: Page {
                    offset: 2,
                    limit: 2,
                },
            },
            &actor,
            &store,
        )
        .await;

        assert_eq!(window.len(), 2);
    }

    #[tokio::test]
    async fn test_get_my_submissions_artist_sees_inbox() {
        let store = InMemoryDocumentStore::new();
        let artist_id = Uuid::new_v4();
        seed(
            &store,
            artist_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            SubmissionStatus::Created,
            fixed_now(),
        )
        .await;
        // Another artist's submission must not leak in.
        seed(
            &store,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            SubmissionStatus::Created,
            fixed_now(),
        )
        .await;
        let actor = actor(artist_id, ActorRole::Artist);

        let mine = get_my_submissions(
            &GetMySubmissions {
                status: None,
                page: page(),
            },
            &actor,
            &store,
        )
        .await;

        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].artist_id, artist_id);
    }

    #[tokio::test]
    async fn test_get_my_submissions_curator_sees_submissions_across_catalogs() {
        let store = InMemoryDocumentStore::new();
        let curator_user_id = Uuid::new_v4();
        seed(
            &store,
            Uuid::new_v4(),
            curator_user_id,
            Uuid::new_v4(),
            SubmissionStatus::Created,
            fixed_now(),
        )
        .await;
        seed(
            &store,
            Uuid::new_v4(),
            curator_user_id,
            Uuid::new_v4(),
            SubmissionStatus::Approved,
            fixed_now(),
        )
        .await;
        let actor = actor(curator_user_id, ActorRole::Curator);

        let mine = get_my_submissions(
            &GetMySubmissions {
                status: None,
                page: page(),
            },
            &actor,
            &store,
        )
        .await;

        assert_eq!(mine.len(), 2);
    }

    #[tokio::test]
    async fn test_get_my_submissions_unknown_role_is_empty() {
        let store = InMemoryDocumentStore::new();
        let user_id = Uuid::new_v4();
        seed(
            &store,
            user_id,
            user_id,
            Uuid::new_v4(),
            SubmissionStatus::Created,
            fixed_now(),
        )
        .await;
        let actor = actor(user_id, ActorRole::Unknown);

        let mine = get_my_submissions(
            &GetMySubmissions {
                status: None,
                page: page(),
            },
            &actor,
            &store,
        )
        .await;

        assert!(mine.is_empty());
    }

    // Per-catalog counters match the seeded distribution.
    #[tokio::test]
    async fn test_stats_aggregates_per_catalog_item() {
        let store = InMemoryDocumentStore::new();
        let clock = FixedClock(fixed_now());
        let curator_user_id = Uuid::new_v4();
        let catalog_one = Uuid::new_v4();
        let catalog_two = Uuid::new_v4();

        for status in [
            SubmissionStatus::Created,
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected,
        ] {
            seed(
                &store,
                Uuid::new_v4(),
                curator_user_id,
                catalog_one,
                status,
                fixed_now(),
            )
            .await;
        }
        seed(
            &store,
            Uuid::new_v4(),
            curator_user_id,
            catalog_two,
            SubmissionStatus::Created,
            fixed_now(),
        )
        .await;

        let stats = get_submission_stats(curator_user_id, &clock, &store).await;

        assert_eq!(stats.len(), 2);
        let one = stats
            .iter()
            .find(|s| s.catalog_item_id == catalog_one)
            .unwrap();
        assert_eq!(one.total, 3);
        assert_eq!(one.pending, 1);
        assert_eq!(one.accepted, 1);
        assert_eq!(one.declined, 1);
        let two = stats
            .iter()
            .find(|s| s.catalog_item_id == catalog_two)
            .unwrap();
        assert_eq!(two.total, 1);
        assert_eq!(two.pending, 1);
        assert_eq!(two.accepted, 0);
        assert_eq!(two.declined, 0);
    }

    // Week and month windows count from Monday 00:00 UTC and the first
    // of the month.
    #[tokio::test]
    async fn test_stats_week_and_month_windows() {
        let store = InMemoryDocumentStore::new();
        // Wednesday 2026-03-11; week starts Monday 2026-03-09 00:00 UTC.
        let clock = FixedClock(fixed_now());
        let curator_user_id = Uuid::new_v4();
        let catalog_item_id = Uuid::new_v4();

        let in_week = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
        let in_month_only = Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2026, 2, 25, 10, 0, 0).unwrap();

        for created_at in [in_week, in_month_only, last_month] {
            seed(
                &store,
                Uuid::new_v4(),
                curator_user_id,
                catalog_item_id,
                SubmissionStatus::Created,
                created_at,
            )
            .await;
        }

        let stats = get_submission_stats(curator_user_id, &clock, &store).await;

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total, 3);
        assert_eq!(stats[0].this_week, 1);
        assert_eq!(stats[0].this_month, 2);
    }

    #[tokio::test]
    async fn test_stats_ignore_outbox_documents_in_partition() {
        let store = InMemoryDocumentStore::new();
        let clock = FixedClock(fixed_now());
        let curator_user_id = Uuid::new_v4();
        let catalog_item_id = Uuid::new_v4();
        seed(
            &store,
            Uuid::new_v4(),
            curator_user_id,
            catalog_item_id,
            SubmissionStatus::Created,
            fixed_now(),
        )
        .await;
        // An outbox event in the same partition must not be counted.
        let submission = Submission::new(
            Uuid::new_v4(),
            curator_user_id,
            catalog_item_id,
            Uuid::new_v4(),
            fixed_now(),
        );
        let event =
            crate::domain::entities::OutboxEvent::submission_created(&submission, Uuid::new_v4())
                .unwrap();
        store
            .create(&submission.partition_key(), event.to_document().unwrap())
            .await
            .unwrap();

        let stats = get_submission_stats(curator_user_id, &clock, &store).await;

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total, 1);
    }

    #[test]
    fn test_start_of_iso_week_is_monday_midnight() {
        let wednesday = Utc.with_ymd_and_hms(2026, 3, 11, 17, 30, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
        assert_eq!(start_of_iso_week(wednesday), monday);

        // A Monday maps to itself at midnight.
        let monday_noon = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(start_of_iso_week(monday_noon), monday);

        // A Sunday belongs to the week started the previous Monday.
        let sunday = Utc.with_ymd_and_hms(2026, 3, 15, 23, 59, 0).unwrap();
        assert_eq!(start_of_iso_week(sunday), monday);
    }

    #[test]
    fn test_start_of_month_is_first_at_midnight() {
        let mid_month = Utc.with_ymd_and_hms(2026, 3, 11, 17, 30, 0).unwrap();
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(start_of_month(mid_month), first);
    }
}
