//! Trackpitch — submission lifecycle bounded context.
//!
//! An artist pitches a track to a curated catalog slot. The submission is
//! stored twice: an authoritative curator-partitioned record and an
//! artist-partitioned inbox mirror, kept consistent by the write path.
//! Every state change appends an outbox event in the same atomic batch as
//! the authoritative write.

pub mod application;
pub mod domain;
