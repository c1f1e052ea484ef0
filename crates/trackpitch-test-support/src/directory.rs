//! Static lookup directories for tests.

use trackpitch_core::lookup::{
    CatalogDirectory, CatalogItemSummary, LookupError, TrackDirectory, TrackSummary,
};
use uuid::Uuid;

/// A track directory that answers every lookup the same way.
#[derive(Debug)]
pub struct StaticTrackDirectory {
    title: Option<String>,
}

impl StaticTrackDirectory {
    /// Every lookup succeeds with the given title.
    #[must_use]
    pub fn found(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    /// Every lookup fails with `LookupError::NotFound`.
    #[must_use]
    pub fn missing() -> Self {
        Self { title: None }
    }
}

#[async_trait::async_trait]
impl TrackDirectory for StaticTrackDirectory {
    async fn track_by_id(
        &self,
        _track_id: Uuid,
        _artist_id: Uuid,
    ) -> Result<TrackSummary, LookupError> {
        match &self.title {
            Some(title) => Ok(TrackSummary {
                title: title.clone(),
            }),
            None => Err(LookupError::NotFound),
        }
    }
}

/// A catalog directory that answers every lookup the same way.
#[derive(Debug)]
pub struct StaticCatalogDirectory {
    name: Option<String>,
}

impl StaticCatalogDirectory {
    /// Every lookup succeeds with the given name.
    #[must_use]
    pub fn found(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Every lookup fails with `LookupError::NotFound`.
    #[must_use]
    pub fn missing() -> Self {
        Self { name: None }
    }
}

#[async_trait::async_trait]
impl CatalogDirectory for StaticCatalogDirectory {
    async fn catalog_item_by_id(
        &self,
        _catalog_item_id: Uuid,
        _curator_user_id: Uuid,
    ) -> Result<CatalogItemSummary, LookupError> {
        match &self.name {
            Some(name) => Ok(CatalogItemSummary { name: name.clone() }),
            None => Err(LookupError::NotFound),
        }
    }
}
