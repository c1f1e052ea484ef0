//! HTTP surface of the Trackpitch submission service.

pub mod clients;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
