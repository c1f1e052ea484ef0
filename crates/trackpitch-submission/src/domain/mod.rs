//! Domain model for the submission context.

pub mod commands;
pub mod dto;
pub mod entities;
pub mod events;
