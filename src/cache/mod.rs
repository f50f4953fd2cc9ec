//! Durable entity cache with offline support.
//!
//! This module provides a domain-agnostic caching mechanism that:
//! - Stores entities keyed by `(entity_type, id)` as serialized JSON
//! - Upserts batches inside a single transaction (all-or-nothing)
//! - Tracks the last successful sync per entity type
//! - Survives process restarts so cached data can be shown before the network answers

mod storage;
mod traits;

pub use storage::{CacheReader, CacheStore, CacheWriter, SqliteStore};
pub use traits::{Cacheable, MergePolicy, SyncMarker, UpsertCounts};
