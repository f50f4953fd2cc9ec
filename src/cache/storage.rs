//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::traits::{Cacheable, MergePolicy, SyncMarker, UpsertCounts};

/// Trait for cache storage backends.
///
/// Writes only happen through [`CacheStore::write`], which hands the closure a
/// [`CacheWriter`] bound to a single transaction. Either everything the
/// closure did becomes visible, or nothing does.
pub trait CacheStore: Send + Sync + 'static {
  /// Get every cached entity of a type, ordered by id.
  fn fetch_all<T: Cacheable>(&self) -> Result<Vec<T>>;

  /// Run `f` against one consistent view of the cache.
  ///
  /// Nothing committed while `f` runs is visible to it, so reading several
  /// entity types here never mixes the results of two merges.
  fn read<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&CacheReader<'_>) -> Result<R>;

  /// Run `f` inside one write transaction, committing only if it returns `Ok`.
  fn write<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut CacheWriter<'_>) -> Result<R>;

  /// Delete every cached entity and every sync marker.
  fn delete_all(&self) -> Result<()>;

  /// Get the last-sync bookkeeping for an entity type.
  fn sync_marker(&self, entity_type: &str) -> Result<Option<SyncMarker>>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the cache database at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
          .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
      }
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open the cache database at the default location.
  pub fn open_default() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open(&path)
  }

  /// Open a throwaway cache that lives only as long as this value.
  #[allow(dead_code)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::with_connection(conn)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("friendsync").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Entity cache (stores serialized JSON)
CREATE TABLE IF NOT EXISTS entity_cache (
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL,
    PRIMARY KEY (entity_type, entity_id)
);

-- Last successful sync per entity type
CREATE TABLE IF NOT EXISTS sync_state (
    entity_type TEXT PRIMARY KEY,
    last_synced_at TEXT NOT NULL,
    payload_digest TEXT
);
"#;

impl CacheStore for SqliteStore {
  fn fetch_all<T: Cacheable>(&self) -> Result<Vec<T>> {
    let conn = self.lock()?;
    query_entities(&conn)
  }

  fn read<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&CacheReader<'_>) -> Result<R>,
  {
    let mut conn = self.lock()?;
    // Read-only; dropping the transaction ends it
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin read transaction: {}", e))?;

    f(&CacheReader { conn: &tx })
  }

  fn write<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut CacheWriter<'_>) -> Result<R>,
  {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    let mut writer = CacheWriter { tx };
    // Dropping the writer on error rolls the transaction back
    let out = f(&mut writer)?;

    writer
      .tx
      .commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(out)
  }

  fn delete_all(&self) -> Result<()> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute("DELETE FROM entity_cache", [])
      .map_err(|e| eyre!("Failed to clear entity cache: {}", e))?;
    tx.execute("DELETE FROM sync_state", [])
      .map_err(|e| eyre!("Failed to clear sync state: {}", e))?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn sync_marker(&self, entity_type: &str) -> Result<Option<SyncMarker>> {
    let conn = self.lock()?;

    let row: Option<(String, Option<String>)> = conn
      .query_row(
        "SELECT last_synced_at, payload_digest FROM sync_state WHERE entity_type = ?",
        params![entity_type],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read sync state: {}", e))?;

    match row {
      Some((synced_at, payload_digest)) => Ok(Some(SyncMarker {
        entity_type: entity_type.to_string(),
        last_synced_at: parse_datetime(&synced_at)?,
        payload_digest,
      })),
      None => Ok(None),
    }
  }
}

/// Read access to the cache, scoped to one open transaction.
pub struct CacheReader<'conn> {
  conn: &'conn Connection,
}

impl CacheReader<'_> {
  /// Get every cached entity of a type, ordered by id.
  pub fn fetch_all<T: Cacheable>(&self) -> Result<Vec<T>> {
    query_entities(self.conn)
  }
}

fn query_entities<T: Cacheable>(conn: &Connection) -> Result<Vec<T>> {
  let entity_type = T::entity_type();

  let mut stmt = conn
    .prepare(
      "SELECT entity_id, data FROM entity_cache
       WHERE entity_type = ?
       ORDER BY entity_id",
    )
    .map_err(|e| eyre!("Failed to prepare entity query: {}", e))?;

  let rows: Vec<(i64, Vec<u8>)> = stmt
    .query_map(params![entity_type], |row| Ok((row.get(0)?, row.get(1)?)))
    .map_err(|e| eyre!("Failed to query entities: {}", e))?
    .collect::<rusqlite::Result<_>>()
    .map_err(|e| eyre!("Failed to read entity row: {}", e))?;

  let entities = rows
    .into_iter()
    .filter_map(|(id, data)| match serde_json::from_slice::<T>(&data) {
      Ok(entity) => Some(entity),
      Err(e) => {
        tracing::warn!(entity_type, id, error = %e, "skipping undecodable cache row");
        None
      }
    })
    .collect();

  Ok(entities)
}

/// Write access to the cache, scoped to one open transaction.
pub struct CacheWriter<'conn> {
  tx: Transaction<'conn>,
}

impl CacheWriter<'_> {
  /// Insert-or-overwrite every record by id.
  ///
  /// Existing rows with the same id are replaced by `record.reconcile(existing)`;
  /// rows whose id is not in `records` are left untouched.
  pub fn upsert<T: Cacheable>(&mut self, records: &[T], policy: MergePolicy) -> Result<UpsertCounts> {
    let entity_type = T::entity_type();
    let cached_at = Utc::now().to_rfc3339();
    let mut counts = UpsertCounts::default();

    for record in records {
      let id = record.cache_id();

      let existing: Option<Vec<u8>> = self
        .tx
        .query_row(
          "SELECT data FROM entity_cache WHERE entity_type = ? AND entity_id = ?",
          params![entity_type, id],
          |row| row.get(0),
        )
        .optional()
        .map_err(|e| eyre!("Failed to look up {} {}: {}", entity_type, id, e))?;

      let row = match existing {
        Some(data) => {
          counts.updated += 1;
          match serde_json::from_slice::<T>(&data) {
            Ok(existing) => record.clone().reconcile(&existing, policy),
            // An unreadable row has nothing worth preserving
            Err(_) => record.clone(),
          }
        }
        None => {
          counts.inserted += 1;
          record.clone()
        }
      };

      let data =
        serde_json::to_vec(&row).map_err(|e| eyre!("Failed to serialize entity: {}", e))?;

      self
        .tx
        .execute(
          "INSERT INTO entity_cache (entity_type, entity_id, data, cached_at)
           VALUES (?, ?, ?, ?)
           ON CONFLICT (entity_type, entity_id)
           DO UPDATE SET data = excluded.data, cached_at = excluded.cached_at",
          params![entity_type, id, data, cached_at],
        )
        .map_err(|e| eyre!("Failed to store {} {}: {}", entity_type, id, e))?;
    }

    Ok(counts)
  }

  /// Record a successful sync for an entity type.
  pub fn set_sync_marker(
    &mut self,
    entity_type: &str,
    synced_at: DateTime<Utc>,
    payload_digest: Option<&str>,
  ) -> Result<()> {
    self
      .tx
      .execute(
        "INSERT OR REPLACE INTO sync_state (entity_type, last_synced_at, payload_digest)
         VALUES (?, ?, ?)",
        params![entity_type, synced_at.to_rfc3339(), payload_digest],
      )
      .map_err(|e| eyre!("Failed to update sync state: {}", e))?;

    Ok(())
  }
}

/// Parse an RFC 3339 timestamp written by this store.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Note {
    id: i64,
    text: String,
    #[serde(default)]
    pinned: bool,
  }

  impl Cacheable for Note {
    fn cache_id(&self) -> i64 {
      self.id
    }

    fn entity_type() -> &'static str {
      "note"
    }

    fn reconcile(self, existing: &Self, policy: MergePolicy) -> Self {
      match policy {
        MergePolicy::Overwrite => self,
        MergePolicy::PreserveLocal => Note {
          pinned: existing.pinned,
          ..self
        },
      }
    }
  }

  fn note(id: i64, text: &str, pinned: bool) -> Note {
    Note {
      id,
      text: text.to_string(),
      pinned,
    }
  }

  #[test]
  fn test_empty_store_returns_nothing() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.fetch_all::<Note>().unwrap().is_empty());
    assert!(store.sync_marker("note").unwrap().is_none());
  }

  #[test]
  fn test_upsert_inserts_then_updates() {
    let store = SqliteStore::open_in_memory().unwrap();

    let counts = store
      .write(|w| w.upsert(&[note(2, "b", false), note(1, "a", false)], MergePolicy::Overwrite))
      .unwrap();
    assert_eq!(counts, UpsertCounts { inserted: 2, updated: 0 });

    let counts = store
      .write(|w| w.upsert(&[note(1, "a2", false)], MergePolicy::Overwrite))
      .unwrap();
    assert_eq!(counts, UpsertCounts { inserted: 0, updated: 1 });

    let notes = store.fetch_all::<Note>().unwrap();
    assert_eq!(notes, vec![note(1, "a2", false), note(2, "b", false)]);
  }

  #[test]
  fn test_overwrite_policy_replaces_local_fields() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .write(|w| w.upsert(&[note(1, "a", true)], MergePolicy::Overwrite))
      .unwrap();
    store
      .write(|w| w.upsert(&[note(1, "b", false)], MergePolicy::Overwrite))
      .unwrap();

    assert_eq!(store.fetch_all::<Note>().unwrap(), vec![note(1, "b", false)]);
  }

  #[test]
  fn test_preserve_policy_keeps_local_fields() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .write(|w| w.upsert(&[note(1, "a", true)], MergePolicy::Overwrite))
      .unwrap();
    store
      .write(|w| w.upsert(&[note(1, "b", false)], MergePolicy::PreserveLocal))
      .unwrap();

    assert_eq!(store.fetch_all::<Note>().unwrap(), vec![note(1, "b", true)]);
  }

  #[test]
  fn test_failed_write_rolls_back() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .write(|w| w.upsert(&[note(1, "a", false)], MergePolicy::Overwrite))
      .unwrap();

    let result: Result<()> = store.write(|w| {
      w.upsert(&[note(1, "changed", false), note(2, "new", false)], MergePolicy::Overwrite)?;
      w.set_sync_marker("note", Utc::now(), None)?;
      Err(eyre!("boom"))
    });

    assert!(result.is_err());
    assert_eq!(store.fetch_all::<Note>().unwrap(), vec![note(1, "a", false)]);
    assert!(store.sync_marker("note").unwrap().is_none());
  }

  #[test]
  fn test_sync_marker_round_trip() {
    let store = SqliteStore::open_in_memory().unwrap();
    let now = Utc::now();
    store
      .write(|w| w.set_sync_marker("note", now, Some("abc")))
      .unwrap();

    let marker = store.sync_marker("note").unwrap().unwrap();
    assert_eq!(marker.entity_type, "note");
    assert_eq!(marker.last_synced_at, now);
    assert_eq!(marker.payload_digest.as_deref(), Some("abc"));
  }

  #[test]
  fn test_delete_all_is_idempotent() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .write(|w| {
        w.upsert(&[note(1, "a", false)], MergePolicy::Overwrite)?;
        w.set_sync_marker("note", Utc::now(), None)
      })
      .unwrap();

    store.delete_all().unwrap();
    store.delete_all().unwrap();

    assert!(store.fetch_all::<Note>().unwrap().is_empty());
    assert!(store.sync_marker("note").unwrap().is_none());
  }

  #[test]
  fn test_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");

    {
      let store = SqliteStore::open(&path).unwrap();
      store
        .write(|w| w.upsert(&[note(7, "kept", false)], MergePolicy::Overwrite))
        .unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.fetch_all::<Note>().unwrap(), vec![note(7, "kept", false)]);
  }

  #[test]
  fn test_types_are_isolated() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
      id: i64,
    }

    impl Cacheable for Tag {
      fn cache_id(&self) -> i64 {
        self.id
      }

      fn entity_type() -> &'static str {
        "tag"
      }
    }

    let store = SqliteStore::open_in_memory().unwrap();
    store
      .write(|w| {
        w.upsert(&[note(1, "a", false)], MergePolicy::Overwrite)?;
        w.upsert(&[Tag { id: 1 }], MergePolicy::Overwrite)
      })
      .unwrap();

    assert_eq!(store.fetch_all::<Note>().unwrap().len(), 1);
    assert_eq!(store.fetch_all::<Tag>().unwrap(), vec![Tag { id: 1 }]);
  }

  #[test]
  fn test_read_never_mixes_two_writes() {
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Label {
      id: i64,
      text: String,
    }

    impl Cacheable for Label {
      fn cache_id(&self) -> i64 {
        self.id
      }

      fn entity_type() -> &'static str {
        "label"
      }
    }

    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let writer_store = Arc::clone(&store);
    let writer = std::thread::spawn(move || {
      for n in 0..2000 {
        let text = format!("v{}", n);
        writer_store
          .write(|w| {
            w.upsert(&[note(1, &text, false)], MergePolicy::Overwrite)?;
            w.upsert(
              &[Label {
                id: 1,
                text: text.clone(),
              }],
              MergePolicy::Overwrite,
            )
          })
          .unwrap();
      }
    });

    while !writer.is_finished() {
      let (notes, labels) = store
        .read(|r| Ok((r.fetch_all::<Note>()?, r.fetch_all::<Label>()?)))
        .unwrap();
      assert_eq!(notes.len(), labels.len());
      if let (Some(n), Some(l)) = (notes.first(), labels.first()) {
        assert_eq!(n.text, l.text);
      }
    }
    writer.join().unwrap();
  }
}
