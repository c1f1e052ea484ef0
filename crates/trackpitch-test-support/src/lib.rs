//! Shared test mocks and utilities for the Trackpitch platform.

mod clock;
mod directory;
mod sink;
mod store;

pub use clock::FixedClock;
pub use directory::{StaticCatalogDirectory, StaticTrackDirectory};
pub use sink::RecordingPublishSink;
pub use store::InMemoryDocumentStore;
