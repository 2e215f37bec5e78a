//! Post sink implementations.
//!
//! This crate provides concrete implementations of the [`PostSink`] trait
//! for publishing documents to remote services:
//!
//! - [`DiscourseSink`] - Creates and updates posts through the Discourse REST API
//!
//! The [`PostSink`] trait and [`SinkError`] type are defined in
//! `discourse-sync-lib` and re-exported here for convenience.

pub mod discourse_sink;

// Re-export sink implementations
pub use discourse_sink::DiscourseSink;

// Re-export trait and error from lib crate for convenience
pub use discourse_sync_lib::{PostSink, SinkError};
