//! Trackpitch Core — shared abstractions.
//!
//! This crate defines the traits and types the submission bounded context
//! depends on: the partitioned document store, caller identity, external
//! lookups, and the publish sink. It contains no infrastructure code.

pub mod actor;
pub mod clock;
pub mod error;
pub mod lookup;
pub mod publish;
pub mod store;
