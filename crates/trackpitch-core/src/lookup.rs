//! External lookup collaborators.
//!
//! Submission creation consumes two narrow capabilities from other
//! services: "does this track exist" and "does this catalog slot exist".
//! Both are synchronous calls; a failed lookup blocks creation.

use thiserror::Error;

/// Failure of an external lookup call.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The upstream service answered but the resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The upstream call itself failed.
    #[error("upstream call failed: {0}")]
    Upstream(String),
}

/// Denormalized track fields returned by the track service.
#[derive(Debug, Clone)]
pub struct TrackSummary {
    /// Human-readable track title.
    pub title: String,
}

/// Denormalized catalog fields returned by the catalog service.
#[derive(Debug, Clone)]
pub struct CatalogItemSummary {
    /// Human-readable catalog slot name.
    pub name: String,
}

/// Track existence lookup, keyed by (track, owning artist).
#[async_trait::async_trait]
pub trait TrackDirectory: Send + Sync {
    /// Fetches a track owned by the given artist.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the track is missing or the call fails.
    async fn track_by_id(
        &self,
        track_id: uuid::Uuid,
        artist_id: uuid::Uuid,
    ) -> Result<TrackSummary, LookupError>;
}

/// Catalog-slot existence lookup, keyed by (catalog item, owning curator).
#[async_trait::async_trait]
pub trait CatalogDirectory: Send + Sync {
    /// Fetches a catalog slot owned by the given curator.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the slot is missing or the call fails.
    async fn catalog_item_by_id(
        &self,
        catalog_item_id: uuid::Uuid,
        curator_user_id: uuid::Uuid,
    ) -> Result<CatalogItemSummary, LookupError>;
}
