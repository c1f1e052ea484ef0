//! `PostgreSQL` implementation of the `DocumentStore` trait.
//!
//! Documents live in one table keyed by (partition key, id). The
//! partition-scoped atomic batch maps to a SQL transaction; entity tags
//! are fresh UUID strings compared in the write predicate, so a
//! concurrent writer shows up as zero affected rows.

use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream};
use futures::TryStreamExt;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use trackpitch_core::store::{
    BatchOperation, DocumentFilter, DocumentStore, EntityTag, NewDocument, Page, PartitionKey,
    StoreError, StoredDocument,
};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT partition_key, id, doc_type, body, etag, ts FROM documents";
const SCAN_PAGE_SIZE: i64 = 100;

/// PostgreSQL-backed document store.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn fresh_etag() -> String {
    Uuid::new_v4().to_string()
}

fn parse_partition(joined: &str) -> PartitionKey {
    PartitionKey::from_components(joined.split('/').map(str::to_owned).collect())
}

fn row_to_document(row: &PgRow) -> Result<StoredDocument, StoreError> {
    let partition: String = row.try_get("partition_key").map_err(backend)?;
    Ok(StoredDocument {
        id: row.try_get("id").map_err(backend)?,
        partition_key: parse_partition(&partition),
        doc_type: row.try_get("doc_type").map_err(backend)?,
        body: row.try_get("body").map_err(backend)?,
        etag: EntityTag::new(row.try_get::<String, _>("etag").map_err(backend)?),
        timestamp: row.try_get("ts").map_err(backend)?,
    })
}

/// Comparison text for a JSONB field filter: bare strings compare against
/// `->>` output directly, everything else in its JSON rendering.
fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_prefix_clause(builder: &mut QueryBuilder<'_, Postgres>, prefix: &PartitionKey) {
    builder.push(" (partition_key = ");
    builder.push_bind(prefix.to_string());
    builder.push(" OR partition_key LIKE ");
    builder.push_bind(format!("{prefix}/%"));
    builder.push(")");
}

fn push_filter_clauses(builder: &mut QueryBuilder<'_, Postgres>, filter: &DocumentFilter) {
    if let Some(doc_type) = &filter.doc_type {
        builder.push(" AND doc_type = ");
        builder.push_bind(doc_type.clone());
    }
    for (name, value) in &filter.field_equals {
        builder.push(" AND body ->> ");
        builder.push_bind(name.clone());
        builder.push(" = ");
        builder.push_bind(json_text(value));
    }
}

fn push_page_clause(builder: &mut QueryBuilder<'_, Postgres>, page: Page) {
    builder.push(" ORDER BY ts, id OFFSET ");
    builder.push_bind(page.offset);
    builder.push(" LIMIT ");
    builder.push_bind(page.limit);
}

async fn fetch_scan_page(
    pool: &PgPool,
    prefix: &PartitionKey,
    offset: i64,
) -> Result<Vec<StoredDocument>, StoreError> {
    let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
    builder.push(" WHERE");
    push_prefix_clause(&mut builder, prefix);
    push_page_clause(
        &mut builder,
        Page {
            offset,
            limit: SCAN_PAGE_SIZE,
        },
    );
    let rows = builder.build().fetch_all(pool).await.map_err(backend)?;
    rows.iter().map(row_to_document).collect()
}

#[async_trait::async_trait]
impl DocumentStore for PgDocumentStore {
    async fn read(
        &self,
        partition: &PartitionKey,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let row = sqlx::query(
            "SELECT partition_key, id, doc_type, body, etag, ts \
             FROM documents WHERE partition_key = $1 AND id = $2",
        )
        .bind(partition.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn create(
        &self,
        partition: &PartitionKey,
        document: NewDocument,
    ) -> Result<StoredDocument, StoreError> {
        let etag = fresh_etag();
        let row = sqlx::query(
            "INSERT INTO documents (partition_key, id, doc_type, body, etag, ts) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING ts",
        )
        .bind(partition.to_string())
        .bind(document.id)
        .bind(&document.doc_type)
        .bind(&document.body)
        .bind(&etag)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict
            } else {
                backend(e)
            }
        })?;
        let timestamp: DateTime<Utc> = row.try_get("ts").map_err(backend)?;
        Ok(StoredDocument {
            id: document.id,
            partition_key: partition.clone(),
            doc_type: document.doc_type,
            body: document.body,
            etag: EntityTag::new(etag),
            timestamp,
        })
    }

    async fn replace(
        &self,
        partition: &PartitionKey,
        document: NewDocument,
        if_match: &EntityTag,
    ) -> Result<StoredDocument, StoreError> {
        let etag = fresh_etag();
        let row = sqlx::query(
            "UPDATE documents SET doc_type = $3, body = $4, etag = $5, ts = NOW() \
             WHERE partition_key = $1 AND id = $2 AND etag = $6 RETURNING ts",
        )
        .bind(partition.to_string())
        .bind(document.id)
        .bind(&document.doc_type)
        .bind(&document.body)
        .bind(&etag)
        .bind(if_match.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => {
                let timestamp: DateTime<Utc> = row.try_get("ts").map_err(backend)?;
                Ok(StoredDocument {
                    id: document.id,
                    partition_key: partition.clone(),
                    doc_type: document.doc_type,
                    body: document.body,
                    etag: EntityTag::new(etag),
                    timestamp,
                })
            }
            None => {
                // Zero rows is either a tag mismatch or a vanished document.
                let exists =
                    sqlx::query("SELECT 1 FROM documents WHERE partition_key = $1 AND id = $2")
                        .bind(partition.to_string())
                        .bind(document.id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(backend)?;
                if exists.is_some() {
                    Err(StoreError::Conflict)
                } else {
                    Err(StoreError::NotFound)
                }
            }
        }
    }

    async fn delete(&self, partition: &PartitionKey, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE partition_key = $1 AND id = $2")
            .bind(partition.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn execute_batch(
        &self,
        partition: &PartitionKey,
        operations: Vec<BatchOperation>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        for operation in operations {
            match operation {
                BatchOperation::Create(document) => {
                    let result = sqlx::query(
                        "INSERT INTO documents (partition_key, id, doc_type, body, etag, ts) \
                         VALUES ($1, $2, $3, $4, $5, NOW())",
                    )
                    .bind(partition.to_string())
                    .bind(document.id)
                    .bind(&document.doc_type)
                    .bind(&document.body)
                    .bind(fresh_etag())
                    .execute(&mut *tx)
                    .await;
                    if let Err(e) = result {
                        return Err(if is_unique_violation(&e) {
                            StoreError::Conflict
                        } else {
                            StoreError::BatchFailed { status: 500 }
                        });
                    }
                }
                BatchOperation::Replace { document, if_match } => {
                    let result = sqlx::query(
                        "UPDATE documents SET doc_type = $3, body = $4, etag = $5, ts = NOW() \
                         WHERE partition_key = $1 AND id = $2 AND etag = $6",
                    )
                    .bind(partition.to_string())
                    .bind(document.id)
                    .bind(&document.doc_type)
                    .bind(&document.body)
                    .bind(fresh_etag())
                    .bind(if_match.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(|_| StoreError::BatchFailed { status: 500 })?;
                    // Zero rows means a concurrent writer beat this batch.
                    if result.rows_affected() == 0 {
                        return Err(StoreError::Conflict);
                    }
                }
                BatchOperation::Delete { id } => {
                    let result =
                        sqlx::query("DELETE FROM documents WHERE partition_key = $1 AND id = $2")
                            .bind(partition.to_string())
                            .bind(id)
                            .execute(&mut *tx)
                            .await
                            .map_err(|_| StoreError::BatchFailed { status: 500 })?;
                    if result.rows_affected() == 0 {
                        return Err(StoreError::NotFound);
                    }
                }
            }
        }
        tx.commit().await.map_err(backend)
    }

    async fn query(
        &self,
        partition_prefix: &PartitionKey,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        builder.push(" WHERE");
        push_prefix_clause(&mut builder, partition_prefix);
        push_filter_clauses(&mut builder, filter);
        push_page_clause(&mut builder, page);
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(row_to_document).collect()
    }

    async fn query_all(
        &self,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        builder.push(" WHERE TRUE");
        push_filter_clauses(&mut builder, filter);
        push_page_clause(&mut builder, page);
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(row_to_document).collect()
    }

    fn scan(
        &self,
        partition_prefix: &PartitionKey,
    ) -> BoxStream<'static, Result<StoredDocument, StoreError>> {
        let pool = self.pool.clone();
        let prefix = partition_prefix.clone();
        Box::pin(
            stream::try_unfold((pool, prefix, 0_i64), |(pool, prefix, offset)| async move {
                let page = fetch_scan_page(&pool, &prefix, offset).await?;
                if page.is_empty() {
                    return Ok(None);
                }
                let next_offset = offset + i64::try_from(page.len()).unwrap_or(i64::MAX);
                Ok(Some((
                    stream::iter(page.into_iter().map(Ok)),
                    (pool, prefix, next_offset),
                )))
            })
            .try_flatten(),
        )
    }
}
