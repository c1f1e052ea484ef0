//! In-memory `DocumentStore` with write-call accounting and failure
//! injection, for exercising the write path's compensation and
//! conflict-tolerance behavior without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use trackpitch_core::store::{
    BatchOperation, DocumentFilter, DocumentStore, EntityTag, NewDocument, Page, PartitionKey,
    StoreError, StoredDocument,
};
use uuid::Uuid;

#[derive(Debug)]
struct Inner {
    documents: HashMap<(PartitionKey, Uuid), StoredDocument>,
    base_time: DateTime<Utc>,
    sequence: i64,
    write_calls: usize,
    batch_failure: Option<StoreError>,
    replace_failure: Option<StoreError>,
}

impl Inner {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.sequence += 1;
        self.base_time + Duration::milliseconds(self.sequence)
    }
}

/// Partitioned in-memory document store. Batches are atomic: every
/// operation is validated before any is applied.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    inner: Mutex<Inner>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                documents: HashMap::new(),
                base_time: Utc::now(),
                sequence: 0,
                write_calls: 0,
                batch_failure: None,
                replace_failure: None,
            }),
        }
    }

    /// Makes the next `execute_batch` call fail with the given error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_batch(&self, error: StoreError) {
        self.inner.lock().unwrap().batch_failure = Some(error);
    }

    /// Makes the next `replace` call fail with the given error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_replace(&self, error: StoreError) {
        self.inner.lock().unwrap().replace_failure = Some(error);
    }

    /// Number of write operations (create/replace/delete/batch) invoked.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn write_call_count(&self) -> usize {
        self.inner.lock().unwrap().write_calls
    }

    /// Total number of stored documents across all partitions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn document_count(&self) -> usize {
        self.inner.lock().unwrap().documents.len()
    }

    fn sorted_matching(
        inner: &Inner,
        partition_prefix: Option<&PartitionKey>,
        filter: &DocumentFilter,
    ) -> Vec<StoredDocument> {
        let mut documents: Vec<StoredDocument> = inner
            .documents
            .values()
            .filter(|document| {
                partition_prefix.is_none_or(|prefix| document.partition_key.starts_with(prefix))
                    && filter.matches(document)
            })
            .cloned()
            .collect();
        documents.sort_by_key(|document| (document.timestamp, document.id));
        documents
    }

    fn page_of(documents: Vec<StoredDocument>, page: Page) -> Vec<StoredDocument> {
        let offset = usize::try_from(page.offset).unwrap_or(0);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
        documents.into_iter().skip(offset).take(limit).collect()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn fresh_etag() -> EntityTag {
    EntityTag::new(Uuid::new_v4().to_string())
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read(
        &self,
        partition: &PartitionKey,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.documents.get(&(partition.clone(), id)).cloned())
    }

    async fn create(
        &self,
        partition: &PartitionKey,
        document: NewDocument,
    ) -> Result<StoredDocument, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.write_calls += 1;
        let key = (partition.clone(), document.id);
        if inner.documents.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        let timestamp = inner.next_timestamp();
        let stored = StoredDocument {
            id: document.id,
            partition_key: partition.clone(),
            doc_type: document.doc_type,
            body: document.body,
            etag: fresh_etag(),
            timestamp,
        };
        inner.documents.insert(key, stored.clone());
        Ok(stored)
    }

    async fn replace(
        &self,
        partition: &PartitionKey,
        document: NewDocument,
        if_match: &EntityTag,
    ) -> Result<StoredDocument, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.write_calls += 1;
        if let Some(error) = inner.replace_failure.take() {
            return Err(error);
        }
        let timestamp = inner.next_timestamp();
        let key = (partition.clone(), document.id);
        let Some(existing) = inner.documents.get_mut(&key) else {
            return Err(StoreError::NotFound);
        };
        if existing.etag != *if_match {
            return Err(StoreError::Conflict);
        }
        existing.doc_type = document.doc_type;
        existing.body = document.body;
        existing.etag = fresh_etag();
        existing.timestamp = timestamp;
        Ok(existing.clone())
    }

    async fn delete(&self, partition: &PartitionKey, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.write_calls += 1;
        match inner.documents.remove(&(partition.clone(), id)) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn execute_batch(
        &self,
        partition: &PartitionKey,
        operations: Vec<BatchOperation>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.write_calls += 1;
        if let Some(error) = inner.batch_failure.take() {
            return Err(error);
        }

        // Validate everything before applying anything.
        for operation in &operations {
            match operation {
                BatchOperation::Create(document) => {
                    if inner
                        .documents
                        .contains_key(&(partition.clone(), document.id))
                    {
                        return Err(StoreError::Conflict);
                    }
                }
                BatchOperation::Replace { document, if_match } => {
                    match inner.documents.get(&(partition.clone(), document.id)) {
                        None => return Err(StoreError::NotFound),
                        Some(existing) if existing.etag != *if_match => {
                            return Err(StoreError::Conflict);
                        }
                        Some(_) => {}
                    }
                }
                BatchOperation::Delete { id } => {
                    if !inner.documents.contains_key(&(partition.clone(), *id)) {
                        return Err(StoreError::NotFound);
                    }
                }
            }
        }

        for operation in operations {
            match operation {
                BatchOperation::Create(document) => {
                    let timestamp = inner.next_timestamp();
                    let stored = StoredDocument {
                        id: document.id,
                        partition_key: partition.clone(),
                        doc_type: document.doc_type,
                        body: document.body,
                        etag: fresh_etag(),
                        timestamp,
                    };
                    inner.documents.insert((partition.clone(), stored.id), stored);
                }
                BatchOperation::Replace { document, .. } => {
                    let timestamp = inner.next_timestamp();
                    if let Some(existing) =
                        inner.documents.get_mut(&(partition.clone(), document.id))
                    {
                        existing.doc_type = document.doc_type;
                        existing.body = document.body;
                        existing.etag = fresh_etag();
                        existing.timestamp = timestamp;
                    }
                }
                BatchOperation::Delete { id } => {
                    inner.documents.remove(&(partition.clone(), id));
                }
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        partition_prefix: &PartitionKey,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let documents = Self::sorted_matching(&inner, Some(partition_prefix), filter);
        Ok(Self::page_of(documents, page))
    }

    async fn query_all(
        &self,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let documents = Self::sorted_matching(&inner, None, filter);
        Ok(Self::page_of(documents, page))
    }

    fn scan(
        &self,
        partition_prefix: &PartitionKey,
    ) -> BoxStream<'static, Result<StoredDocument, StoreError>> {
        let documents = {
            let inner = self.inner.lock().unwrap();
            Self::sorted_matching(&inner, Some(partition_prefix), &DocumentFilter::default())
        };
        stream::iter(documents.into_iter().map(Ok)).boxed()
    }
}
