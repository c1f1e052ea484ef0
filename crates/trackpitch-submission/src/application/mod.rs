//! Application layer: write path, read path, and the outbox relay.

pub mod command_handlers;
pub mod outbox_relay;
pub mod query_handlers;
