//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Trait for entities that can be cached.
///
/// Implementors provide a stable integer identity; the store keys every row by
/// `(entity_type, cache_id)`.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Stable identity of this entity within its type
  fn cache_id(&self) -> i64;

  /// Entity type name for storage organization (e.g., "friend", "group")
  fn entity_type() -> &'static str;

  /// Produce the row to store when an entry with the same id is already cached.
  ///
  /// The default is a full replace. Types with fields the remote source never
  /// carries override this to honour [`MergePolicy::PreserveLocal`].
  fn reconcile(self, _existing: &Self, _policy: MergePolicy) -> Self {
    self
  }
}

/// How an incoming record is combined with a cached record of the same id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
  /// Every field of the cached entry is replaced, including local-only fields
  #[default]
  Overwrite,
  /// Wire fields are replaced; fields absent from the wire keep their cached value
  PreserveLocal,
}

/// Outcome of upserting one entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
  pub inserted: usize,
  pub updated: usize,
}

/// Bookkeeping for the last successful sync of one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMarker {
  pub entity_type: String,
  pub last_synced_at: DateTime<Utc>,
  /// Hex digest of the payload that produced this sync
  pub payload_digest: Option<String>,
}
