//! Partitioned document-store abstraction.
//!
//! The backing database groups documents into partitions addressed by a
//! hierarchical [`PartitionKey`]. Atomic multi-document batches are only
//! possible within a single partition; writes across partitions are
//! independent operations with no ordering guarantee. Replaces are guarded
//! by an [`EntityTag`] compared at write time (optimistic concurrency).

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use thiserror::Error;
use uuid::Uuid;

/// Hierarchical partition key. Components are ordered; a shorter key is a
/// prefix addressing every partition underneath it (query/scan only —
/// point reads and writes require the full key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(Vec<String>);

impl PartitionKey {
    /// Creates a partition key with a single leading component.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self(vec![component.into()])
    }

    /// Appends a component to the key.
    #[must_use]
    pub fn and(mut self, component: impl Into<String>) -> Self {
        self.0.push(component.into());
        self
    }

    /// Rebuilds a key from its ordered components.
    #[must_use]
    pub fn from_components(components: Vec<String>) -> Self {
        Self(components)
    }

    /// Returns the ordered components of the key.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Returns true if `self` lives under `prefix` (component-wise).
    #[must_use]
    pub fn starts_with(&self, prefix: &PartitionKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Optimistic concurrency token assigned by the store on every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag(String);

impl EntityTag {
    /// Wraps a raw tag value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw tag value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document as persisted: the caller-supplied body plus store-assigned
/// metadata (entity tag, write timestamp).
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Document identifier, unique within its partition.
    pub id: Uuid,
    /// Full partition key the document lives under.
    pub partition_key: PartitionKey,
    /// Type discriminator; multiple kinds share one logical container.
    pub doc_type: String,
    /// Serialized document body.
    pub body: serde_json::Value,
    /// Concurrency token for the last write.
    pub etag: EntityTag,
    /// Store-assigned timestamp of the last write, used for ordering.
    pub timestamp: DateTime<Utc>,
}

/// A document to be written. Metadata is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Document identifier.
    pub id: Uuid,
    /// Type discriminator.
    pub doc_type: String,
    /// Serialized document body.
    pub body: serde_json::Value,
}

/// One operation inside a partition-scoped atomic batch.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    /// Create a new document; conflicts if the id already exists.
    Create(NewDocument),
    /// Replace an existing document if its entity tag still matches.
    Replace {
        /// The replacement document (same id as the original).
        document: NewDocument,
        /// The entity tag observed when the document was read.
        if_match: EntityTag,
    },
    /// Delete a document by id.
    Delete {
        /// Identifier of the document to delete.
        id: Uuid,
    },
}

/// Equality filter applied to documents during queries.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Restrict to a single type discriminator.
    pub doc_type: Option<String>,
    /// Top-level body fields that must equal the given values.
    pub field_equals: Vec<(String, serde_json::Value)>,
}

impl DocumentFilter {
    /// Filter on the type discriminator.
    #[must_use]
    pub fn of_type(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: Some(doc_type.into()),
            field_equals: Vec::new(),
        }
    }

    /// Adds a body-field equality constraint.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.field_equals.push((name.into(), value));
        self
    }

    /// Returns true if the document satisfies every constraint.
    #[must_use]
    pub fn matches(&self, document: &StoredDocument) -> bool {
        if let Some(doc_type) = &self.doc_type {
            if document.doc_type != *doc_type {
                return false;
            }
        }
        self.field_equals
            .iter()
            .all(|(name, value)| document.body.get(name) == Some(value))
    }
}

/// Offset/limit pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// Number of documents to skip.
    pub offset: i64,
    /// Maximum number of documents to return.
    pub limit: i64,
}

/// Errors surfaced by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("document not found")]
    NotFound,

    /// An optimistic-concurrency conflict: the entity tag no longer matches,
    /// or a created id already exists.
    #[error("write conflict")]
    Conflict,

    /// A transactional batch was rejected for a non-conflict reason.
    #[error("batch rejected with status {status}")]
    BatchFailed {
        /// HTTP-like status code reported by the store.
        status: u16,
    },

    /// A backend/transport failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Generic create/replace/read/batch operations against the partitioned
/// document database.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read of a document by (full partition key, id).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` on transport failure. A missing
    /// document is `Ok(None)`, not an error.
    async fn read(
        &self,
        partition: &PartitionKey,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StoreError>;

    /// Creates a document in the given partition.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the id already exists in the
    /// partition.
    async fn create(
        &self,
        partition: &PartitionKey,
        document: NewDocument,
    ) -> Result<StoredDocument, StoreError>;

    /// Replaces a document if `if_match` still equals its stored entity tag.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` on tag mismatch and
    /// `StoreError::NotFound` if the document does not exist.
    async fn replace(
        &self,
        partition: &PartitionKey,
        document: NewDocument,
        if_match: &EntityTag,
    ) -> Result<StoredDocument, StoreError>;

    /// Deletes a document by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the document does not exist.
    async fn delete(&self, partition: &PartitionKey, id: Uuid) -> Result<(), StoreError>;

    /// Executes all operations atomically within one partition: either every
    /// operation takes effect or none does.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if any operation hits an entity-tag
    /// mismatch or duplicate id, `StoreError::BatchFailed` for other
    /// rejections.
    async fn execute_batch(
        &self,
        partition: &PartitionKey,
        operations: Vec<BatchOperation>,
    ) -> Result<(), StoreError>;

    /// Filtered, paginated query over the partitions under
    /// `partition_prefix`, ordered by store timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` on transport failure.
    async fn query(
        &self,
        partition_prefix: &PartitionKey,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Filtered, paginated query across all partitions, ordered by store
    /// timestamp. Used by out-of-band consumers such as the outbox relay.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` on transport failure.
    async fn query_all(
        &self,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Streams every document under `partition_prefix`, in store-timestamp
    /// order. The stream suspends on each page fetch.
    fn scan(
        &self,
        partition_prefix: &PartitionKey,
    ) -> BoxStream<'static, Result<StoredDocument, StoreError>>;
}
