use serde::{Deserialize, Serialize};

/// A friend as shown in the Friends tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRecord {
  pub id: i64,
  pub name: String,
  pub avatar_url: String,
  pub is_online: bool,
}

/// A group as shown in the Groups tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub avatar_url: String,
  /// Only ever known locally; the remote payload does not carry it
  #[serde(default)]
  pub members_count: u32,
}

/// A photo reference. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
  pub id: i64,
  pub url: String,
}

/// Where a snapshot's friends and groups came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotOrigin {
  /// Read back from the durable cache
  #[default]
  Cache,
  /// Decoded from a successful network fetch
  Network,
}

/// Immutable bundle handed to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
  pub friends: Vec<FriendRecord>,
  pub groups: Vec<GroupRecord>,
  pub photos: Vec<PhotoRecord>,
  pub origin: SnapshotOrigin,
}

impl SyncSnapshot {
  pub fn is_empty(&self) -> bool {
    self.friends.is_empty() && self.groups.is_empty() && self.photos.is_empty()
  }

  pub fn online_friends(&self) -> usize {
    self.friends.iter().filter(|f| f.is_online).count()
  }
}

/// Step a refresh is currently in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPhase {
  #[default]
  Idle,
  Fetching,
  Decoding,
  Merging,
}

impl RefreshPhase {
  pub fn label(&self) -> &'static str {
    match self {
      RefreshPhase::Idle => "idle",
      RefreshPhase::Fetching => "fetching",
      RefreshPhase::Decoding => "decoding",
      RefreshPhase::Merging => "saving",
    }
  }
}
