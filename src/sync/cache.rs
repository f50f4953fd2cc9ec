//! Caching implementations for feed types.

use crate::cache::{Cacheable, MergePolicy};

use super::types::{FriendRecord, GroupRecord};

impl Cacheable for FriendRecord {
  fn cache_id(&self) -> i64 {
    self.id
  }

  fn entity_type() -> &'static str {
    "friend"
  }
}

impl Cacheable for GroupRecord {
  fn cache_id(&self) -> i64 {
    self.id
  }

  fn entity_type() -> &'static str {
    "group"
  }

  fn reconcile(self, existing: &Self, policy: MergePolicy) -> Self {
    match policy {
      MergePolicy::Overwrite => self,
      // members_count never arrives over the wire
      MergePolicy::PreserveLocal => GroupRecord {
        members_count: existing.members_count,
        ..self
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn group(members_count: u32, name: &str) -> GroupRecord {
    GroupRecord {
      id: 3,
      name: name.to_string(),
      description: Some("d".into()),
      avatar_url: String::new(),
      members_count,
    }
  }

  #[test]
  fn test_group_overwrite_resets_members() {
    let merged = group(0, "new").reconcile(&group(42, "old"), MergePolicy::Overwrite);
    assert_eq!(merged, group(0, "new"));
  }

  #[test]
  fn test_group_preserve_keeps_members() {
    let merged = group(0, "new").reconcile(&group(42, "old"), MergePolicy::PreserveLocal);
    assert_eq!(merged, group(42, "new"));
  }

  #[test]
  fn test_friend_always_replaced() {
    let old = FriendRecord {
      id: 1,
      name: "A".into(),
      avatar_url: "a".into(),
      is_online: false,
    };
    let new = FriendRecord {
      id: 1,
      name: "B".into(),
      avatar_url: String::new(),
      is_online: true,
    };
    assert_eq!(new.clone().reconcile(&old, MergePolicy::PreserveLocal), new);
  }
}
