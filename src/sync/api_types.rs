//! Serde-deserializable types matching the remote feed document.
//!
//! These types are separate from domain types so the wire shape can change
//! (and be versioned) without touching what the cache stores.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use super::error::DecodeError;
use super::types::{FriendRecord, GroupRecord, PhotoRecord, SnapshotOrigin, SyncSnapshot};

/// Highest payload version this build understands
pub const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
pub struct ApiFeed {
  /// Absent means version 1
  pub version: Option<u32>,
  #[serde(default)]
  pub friends: Vec<ApiFriend>,
  #[serde(default)]
  pub groups: Vec<ApiGroup>,
  #[serde(default)]
  pub photos: Vec<ApiPhoto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFriend {
  pub id: i64,
  pub name: String,
  pub avatar_url: String,
  pub is_online: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub avatar_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiPhoto {
  pub id: i64,
  pub url: String,
}

impl From<ApiFriend> for FriendRecord {
  fn from(f: ApiFriend) -> Self {
    FriendRecord {
      id: f.id,
      name: f.name,
      avatar_url: f.avatar_url,
      is_online: f.is_online,
    }
  }
}

impl From<ApiGroup> for GroupRecord {
  fn from(g: ApiGroup) -> Self {
    GroupRecord {
      id: g.id,
      name: g.name,
      description: g.description,
      avatar_url: g.avatar_url,
      members_count: 0,
    }
  }
}

impl From<ApiPhoto> for PhotoRecord {
  fn from(p: ApiPhoto) -> Self {
    PhotoRecord { id: p.id, url: p.url }
  }
}

impl ApiFeed {
  pub fn into_snapshot(self) -> Result<SyncSnapshot, DecodeError> {
    let version = self.version.unwrap_or(SUPPORTED_VERSION);
    if version != SUPPORTED_VERSION {
      return Err(DecodeError::UnsupportedVersion(version));
    }

    ensure_unique("friend", self.friends.iter().map(|f| f.id))?;
    ensure_unique("group", self.groups.iter().map(|g| g.id))?;
    ensure_unique("photo", self.photos.iter().map(|p| p.id))?;

    Ok(SyncSnapshot {
      friends: self.friends.into_iter().map(Into::into).collect(),
      groups: self.groups.into_iter().map(Into::into).collect(),
      photos: self.photos.into_iter().map(Into::into).collect(),
      origin: SnapshotOrigin::Network,
    })
  }
}

fn ensure_unique(entity: &'static str, ids: impl Iterator<Item = i64>) -> Result<(), DecodeError> {
  let mut seen = HashSet::new();
  for id in ids {
    if !seen.insert(id) {
      return Err(DecodeError::DuplicateId { entity, id });
    }
  }
  Ok(())
}

/// Decode a raw feed body into a snapshot.
pub fn decode_feed(body: &[u8]) -> Result<SyncSnapshot, DecodeError> {
  let feed: ApiFeed = serde_json::from_slice(body)?;
  feed.into_snapshot()
}

/// Hex SHA-256 of a raw feed body
pub fn payload_digest(body: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(body);
  hex::encode(hasher.finalize())
}
