//! CLI command handlers.

pub mod config;
pub mod query;
pub mod targets;
