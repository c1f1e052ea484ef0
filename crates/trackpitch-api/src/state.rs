//! Shared application state.

use std::sync::Arc;

use trackpitch_core::clock::Clock;
use trackpitch_core::lookup::{CatalogDirectory, TrackDirectory};
use trackpitch_core::store::DocumentStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Partitioned document store holding both submission views.
    pub store: Arc<dyn DocumentStore>,
    /// Clock used for timestamps and stats windows.
    pub clock: Arc<dyn Clock>,
    /// Track existence lookup.
    pub tracks: Arc<dyn TrackDirectory>,
    /// Catalog-slot existence lookup.
    pub catalog: Arc<dyn CatalogDirectory>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        tracks: Arc<dyn TrackDirectory>,
        catalog: Arc<dyn CatalogDirectory>,
    ) -> Self {
        Self {
            store,
            clock,
            tracks,
            catalog,
        }
    }
}
