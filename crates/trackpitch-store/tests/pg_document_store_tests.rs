//! Integration tests for `PgDocumentStore`.

use futures::StreamExt;
use serde_json::json;
use sqlx::PgPool;
use trackpitch_core::store::{
    BatchOperation, DocumentFilter, DocumentStore, EntityTag, NewDocument, Page, PartitionKey,
    StoreError,
};
use trackpitch_store::PgDocumentStore;
use uuid::Uuid;

fn make_document(doc_type: &str, body: serde_json::Value) -> NewDocument {
    NewDocument {
        id: Uuid::new_v4(),
        doc_type: doc_type.to_string(),
        body,
    }
}

fn full_page() -> Page {
    Page {
        offset: 0,
        limit: 100,
    }
}

// --- read / create ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_read_returns_none_for_missing_document(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");

    let found = store.read(&partition, Uuid::new_v4()).await.unwrap();

    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_then_read_round_trip(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");
    let document = make_document("Submission", json!({"status": "Created"}));
    let id = document.id;

    let created = store.create(&partition, document).await.unwrap();
    assert_eq!(created.id, id);
    assert_eq!(created.partition_key, partition);

    let loaded = store.read(&partition, id).await.unwrap().unwrap();
    assert_eq!(loaded.doc_type, "Submission");
    assert_eq!(loaded.body, json!({"status": "Created"}));
    assert_eq!(loaded.etag, created.etag);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_duplicate_id_is_conflict(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");
    let document = make_document("Submission", json!({}));

    store.create(&partition, document.clone()).await.unwrap();
    let result = store.create(&partition, document).await;

    assert!(matches!(result, Err(StoreError::Conflict)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_same_id_in_different_partitions_is_allowed(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let document = make_document("Submission", json!({}));
    let mirror = NewDocument {
        doc_type: "ArtistInbox".to_string(),
        ..document.clone()
    };

    store
        .create(&PartitionKey::new("curator-1").and("catalog-1"), document)
        .await
        .unwrap();
    store
        .create(&PartitionKey::new("artist-1"), mirror)
        .await
        .unwrap();
}

// --- replace ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_replace_with_current_etag_succeeds_and_rotates_tag(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");
    let document = make_document("Submission", json!({"status": "Created"}));
    let created = store.create(&partition, document.clone()).await.unwrap();

    let updated = NewDocument {
        body: json!({"status": "Approved"}),
        ..document
    };
    let replaced = store
        .replace(&partition, updated, &created.etag)
        .await
        .unwrap();

    assert_ne!(replaced.etag, created.etag);
    let loaded = store.read(&partition, replaced.id).await.unwrap().unwrap();
    assert_eq!(loaded.body, json!({"status": "Approved"}));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_replace_with_stale_etag_is_conflict(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");
    let document = make_document("Submission", json!({}));
    store.create(&partition, document.clone()).await.unwrap();

    let result = store
        .replace(&partition, document, &EntityTag::new("stale"))
        .await;

    assert!(matches!(result, Err(StoreError::Conflict)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_replace_missing_document_is_not_found(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");
    let document = make_document("Submission", json!({}));

    let result = store
        .replace(&partition, document, &EntityTag::new("any"))
        .await;

    assert!(matches!(result, Err(StoreError::NotFound)));
}

// --- delete ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_removes_document(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("artist-1");
    let document = make_document("ArtistInbox", json!({}));
    let id = document.id;
    store.create(&partition, document).await.unwrap();

    store.delete(&partition, id).await.unwrap();

    assert!(store.read(&partition, id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_missing_document_is_not_found(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("artist-1");

    let result = store.delete(&partition, Uuid::new_v4()).await;

    assert!(matches!(result, Err(StoreError::NotFound)));
}

// --- execute_batch ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_batch_applies_all_operations(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");
    let submission = make_document("Submission", json!({"status": "Created"}));
    let outbox = make_document("Outbox", json!({"state": "Pending"}));
    let submission_id = submission.id;
    let outbox_id = outbox.id;

    store
        .execute_batch(
            &partition,
            vec![
                BatchOperation::Create(submission),
                BatchOperation::Create(outbox),
            ],
        )
        .await
        .unwrap();

    assert!(store.read(&partition, submission_id).await.unwrap().is_some());
    assert!(store.read(&partition, outbox_id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_batch_is_atomic_on_conflict(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");
    let existing = make_document("Submission", json!({"status": "Created"}));
    store.create(&partition, existing.clone()).await.unwrap();

    let outbox = make_document("Outbox", json!({"state": "Pending"}));
    let outbox_id = outbox.id;
    let result = store
        .execute_batch(
            &partition,
            vec![
                BatchOperation::Create(outbox),
                BatchOperation::Replace {
                    document: existing,
                    if_match: EntityTag::new("stale"),
                },
            ],
        )
        .await;

    assert!(matches!(result, Err(StoreError::Conflict)));
    // The first operation must have been rolled back.
    assert!(store.read(&partition, outbox_id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_batch_replace_and_create_together(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-1");
    let submission = make_document("Submission", json!({"status": "Created"}));
    let created = store.create(&partition, submission.clone()).await.unwrap();

    let updated = NewDocument {
        body: json!({"status": "Approved"}),
        ..submission
    };
    let outbox = make_document("Outbox", json!({"state": "Pending"}));

    store
        .execute_batch(
            &partition,
            vec![
                BatchOperation::Replace {
                    document: updated,
                    if_match: created.etag,
                },
                BatchOperation::Create(outbox),
            ],
        )
        .await
        .unwrap();

    let loaded = store.read(&partition, created.id).await.unwrap().unwrap();
    assert_eq!(loaded.body, json!({"status": "Approved"}));
}

// --- query ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_query_matches_partition_prefix(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let catalog_a = PartitionKey::new("curator-1").and("catalog-a");
    let catalog_b = PartitionKey::new("curator-1").and("catalog-b");
    let other_curator = PartitionKey::new("curator-2").and("catalog-a");

    store
        .create(&catalog_a, make_document("Submission", json!({})))
        .await
        .unwrap();
    store
        .create(&catalog_b, make_document("Submission", json!({})))
        .await
        .unwrap();
    store
        .create(&other_curator, make_document("Submission", json!({})))
        .await
        .unwrap();

    let under_curator = store
        .query(
            &PartitionKey::new("curator-1"),
            &DocumentFilter::default(),
            full_page(),
        )
        .await
        .unwrap();
    assert_eq!(under_curator.len(), 2);

    let under_catalog = store
        .query(&catalog_a, &DocumentFilter::default(), full_page())
        .await
        .unwrap();
    assert_eq!(under_catalog.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_query_prefix_does_not_match_partial_component(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    store
        .create(
            &PartitionKey::new("curator-10").and("catalog-a"),
            make_document("Submission", json!({})),
        )
        .await
        .unwrap();

    let results = store
        .query(
            &PartitionKey::new("curator-1"),
            &DocumentFilter::default(),
            full_page(),
        )
        .await
        .unwrap();

    assert!(results.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_query_filters_on_type_and_body_field(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-a");

    store
        .create(
            &partition,
            make_document("Submission", json!({"status": "Created"})),
        )
        .await
        .unwrap();
    store
        .create(
            &partition,
            make_document("Submission", json!({"status": "Approved"})),
        )
        .await
        .unwrap();
    store
        .create(
            &partition,
            make_document("Outbox", json!({"status": "Created"})),
        )
        .await
        .unwrap();

    let filter = DocumentFilter::of_type("Submission").field("status", json!("Created"));
    let results = store.query(&partition, &filter, full_page()).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_type, "Submission");
    assert_eq!(results[0].body["status"], json!("Created"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_query_paginates_in_timestamp_order(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let partition = PartitionKey::new("curator-1").and("catalog-a");
    for _ in 0..5 {
        store
            .create(&partition, make_document("Submission", json!({})))
            .await
            .unwrap();
    }

    let first = store
        .query(
            &partition,
            &DocumentFilter::default(),
            Page {
                offset: 0,
                limit: 2,
            },
        )
        .await
        .unwrap();
    let second = store
        .query(
            &partition,
            &DocumentFilter::default(),
            Page {
                offset: 2,
                limit: 2,
            },
        )
        .await
        .unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert!(first[1].timestamp <= second[0].timestamp);
    let first_ids: Vec<Uuid> = first.iter().map(|d| d.id).collect();
    assert!(!first_ids.contains(&second[0].id));
}

// --- query_all ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_query_all_spans_partitions(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    store
        .create(
            &PartitionKey::new("curator-1").and("catalog-a"),
            make_document("Outbox", json!({"state": "Pending"})),
        )
        .await
        .unwrap();
    store
        .create(
            &PartitionKey::new("curator-2").and("catalog-b"),
            make_document("Outbox", json!({"state": "Pending"})),
        )
        .await
        .unwrap();
    store
        .create(
            &PartitionKey::new("curator-2").and("catalog-b"),
            make_document("Outbox", json!({"state": "Published"})),
        )
        .await
        .unwrap();

    let filter = DocumentFilter::of_type("Outbox").field("state", json!("Pending"));
    let results = store.query_all(&filter, full_page()).await.unwrap();

    assert_eq!(results.len(), 2);
}

// --- scan ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_scan_streams_all_documents_under_prefix(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let prefix = PartitionKey::new("curator-1");
    for i in 0..7 {
        let catalog = if i % 2 == 0 { "catalog-a" } else { "catalog-b" };
        store
            .create(
                &prefix.clone().and(catalog),
                make_document("Submission", json!({"n": i})),
            )
            .await
            .unwrap();
    }
    store
        .create(
            &PartitionKey::new("curator-2").and("catalog-a"),
            make_document("Submission", json!({})),
        )
        .await
        .unwrap();

    let mut stream = store.scan(&prefix);
    let mut seen = Vec::new();
    while let Some(item) = stream.next().await {
        seen.push(item.unwrap());
    }

    assert_eq!(seen.len(), 7);
    assert!(seen.iter().all(|d| d.partition_key.starts_with(&prefix)));
    for pair in seen.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}
