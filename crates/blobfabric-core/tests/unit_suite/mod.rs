//! Unit tests for blobfabric-core.
//!
//! These tests use in-memory storage, in-memory messaging and scripted
//! provider fakes only.

pub mod helpers;
pub mod large_message;
pub mod listing;
pub mod sinks;
