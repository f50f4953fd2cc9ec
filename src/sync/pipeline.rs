//! Fetch, decode, merge and publish.
//!
//! A refresh moves through `Fetching -> Decoding -> Merging -> Idle`; any
//! failure returns straight to `Idle` without touching the cache. Decoding
//! and the merge run on the blocking pool so the caller's task (typically the
//! UI loop) never waits on JSON parsing or SQLite.
//!
//! Only one refresh may be in flight per pipeline. A second call made while
//! one is outstanding is rejected with [`SyncError::AlreadyInProgress`]
//! rather than queued.

use std::sync::Arc;

use chrono::Utc;
use color_eyre::Result;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinError;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStore, Cacheable, MergePolicy, SyncMarker, UpsertCounts};

use super::api_types::{decode_feed, payload_digest};
use super::client::Fetcher;
use super::error::SyncError;
use super::types::{FriendRecord, GroupRecord, RefreshPhase, SnapshotOrigin, SyncSnapshot};

/// What a successful merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
  pub friends: UpsertCounts,
  pub groups: UpsertCounts,
}

/// Last-sync bookkeeping for both cached entity types.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
  pub friends: Option<SyncMarker>,
  pub groups: Option<SyncMarker>,
}

pub struct SyncPipeline<S: CacheStore, F: Fetcher> {
  store: Arc<S>,
  fetcher: F,
  policy: MergePolicy,
  in_flight: Mutex<()>,
  snapshot_tx: watch::Sender<Arc<SyncSnapshot>>,
  phase_tx: watch::Sender<RefreshPhase>,
}

impl<S: CacheStore, F: Fetcher> SyncPipeline<S, F> {
  /// Create a pipeline over a (possibly shared) cache store.
  pub fn new(store: Arc<S>, fetcher: F) -> Self {
    let (snapshot_tx, _) = watch::channel(Arc::new(SyncSnapshot::default()));
    let (phase_tx, _) = watch::channel(RefreshPhase::Idle);

    Self {
      store,
      fetcher,
      policy: MergePolicy::default(),
      in_flight: Mutex::new(()),
      snapshot_tx,
      phase_tx,
    }
  }

  /// Set how re-received records are combined with cached ones.
  pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Subscribe to every snapshot this pipeline publishes.
  pub fn subscribe(&self) -> watch::Receiver<Arc<SyncSnapshot>> {
    self.snapshot_tx.subscribe()
  }

  /// Subscribe to refresh phase changes.
  pub fn watch_phase(&self) -> watch::Receiver<RefreshPhase> {
    self.phase_tx.subscribe()
  }

  pub fn phase(&self) -> RefreshPhase {
    *self.phase_tx.borrow()
  }

  /// Read the cached friends and groups without touching the network.
  ///
  /// Never fails: an unreadable cache is logged and treated as empty. Photos
  /// are never cached, so they are always empty here.
  pub async fn load_initial(&self) -> SyncSnapshot {
    let store = Arc::clone(&self.store);
    let result = tokio::task::spawn_blocking(move || read_cached(&*store)).await;

    let snapshot = match result {
      Ok(Ok(snapshot)) => snapshot,
      Ok(Err(e)) => {
        warn!(error = %e, "failed to read cache, starting empty");
        SyncSnapshot::default()
      }
      Err(e) => {
        warn!(error = %e, "cache read task failed, starting empty");
        SyncSnapshot::default()
      }
    };

    debug!(
      friends = snapshot.friends.len(),
      groups = snapshot.groups.len(),
      "loaded cached snapshot"
    );

    // Don't replace fresher network data that subscribers already have
    self.snapshot_tx.send_if_modified(|current| {
      if current.origin == SnapshotOrigin::Cache {
        *current = Arc::new(snapshot.clone());
        true
      } else {
        false
      }
    });

    snapshot
  }

  /// Fetch the feed at `source`, merge it into the cache and publish it.
  ///
  /// Dropping the returned future cancels the refresh. If that happens before
  /// the merge has been handed to the blocking pool, the cache is untouched;
  /// once the merge has started it runs to completion.
  pub async fn refresh(&self, source: &str) -> Result<SyncSnapshot, SyncError> {
    let url = parse_source(source)?;

    let _guard = self
      .in_flight
      .try_lock()
      .map_err(|_| SyncError::AlreadyInProgress)?;
    let _phase = PhaseGuard(&self.phase_tx);

    info!(%url, "refresh started");
    let result = self.run_refresh(&url).await;

    match &result {
      Ok(snapshot) => info!(
        friends = snapshot.friends.len(),
        groups = snapshot.groups.len(),
        photos = snapshot.photos.len(),
        "refresh finished"
      ),
      Err(e) => warn!(kind = e.kind(), error = %e, "refresh failed"),
    }

    result
  }

  async fn run_refresh(&self, url: &Url) -> Result<SyncSnapshot, SyncError> {
    self.phase_tx.send_replace(RefreshPhase::Fetching);
    let body = self.fetcher.fetch(url).await?;
    debug!(bytes = body.len(), "feed downloaded");

    self.phase_tx.send_replace(RefreshPhase::Decoding);
    let (snapshot, digest) = tokio::task::spawn_blocking(move || {
      let digest = payload_digest(&body);
      decode_feed(&body).map(|snapshot| (snapshot, digest))
    })
    .await
    .map_err(|e| worker_failed("decode", e))??;

    self.phase_tx.send_replace(RefreshPhase::Merging);
    let store = Arc::clone(&self.store);
    let policy = self.policy;
    let (snapshot, report) = tokio::task::spawn_blocking(move || {
      merge_snapshot(&*store, &snapshot, policy, &digest).map(|report| (snapshot, report))
    })
    .await
    .map_err(|e| worker_failed("merge", e))?
    .map_err(|e| SyncError::Storage(format!("{:#}", e)))?;

    debug!(
      friends_inserted = report.friends.inserted,
      friends_updated = report.friends.updated,
      groups_inserted = report.groups.inserted,
      groups_updated = report.groups.updated,
      "cache merged"
    );

    self.snapshot_tx.send_replace(Arc::new(snapshot.clone()));
    Ok(snapshot)
  }

  /// Drop every cached friend and group and forget when they were synced.
  ///
  /// Never fails; errors are logged. Subscribers receive an empty snapshot.
  pub async fn clear_cache(&self) {
    let store = Arc::clone(&self.store);
    match tokio::task::spawn_blocking(move || store.delete_all()).await {
      Ok(Ok(())) => info!("cache cleared"),
      Ok(Err(e)) => warn!(error = %e, "failed to clear cache"),
      Err(e) => warn!(error = %e, "cache clear task failed"),
    }

    self
      .snapshot_tx
      .send_replace(Arc::new(SyncSnapshot::default()));
  }

  /// When friends and groups were last synced successfully.
  pub async fn sync_status(&self) -> Result<SyncStatus> {
    let store = Arc::clone(&self.store);
    tokio::task::spawn_blocking(move || -> Result<SyncStatus> {
      Ok(SyncStatus {
        friends: store.sync_marker(FriendRecord::entity_type())?,
        groups: store.sync_marker(GroupRecord::entity_type())?,
      })
    })
    .await?
  }
}

/// Resets the phase to idle however the refresh ends, including cancellation
struct PhaseGuard<'a>(&'a watch::Sender<RefreshPhase>);

impl Drop for PhaseGuard<'_> {
  fn drop(&mut self) {
    self.0.send_replace(RefreshPhase::Idle);
  }
}

/// Validate a feed source before any I/O happens.
pub fn parse_source(source: &str) -> Result<Url, SyncError> {
  let url = Url::parse(source.trim()).map_err(|e| SyncError::invalid_source(source, e.to_string()))?;

  match url.scheme() {
    "http" | "https" => {}
    other => {
      return Err(SyncError::invalid_source(
        source,
        format!("unsupported scheme '{}'", other),
      ))
    }
  }

  if url.host_str().map_or(true, str::is_empty) {
    return Err(SyncError::invalid_source(source, "missing host"));
  }

  Ok(url)
}

/// Friends and groups from one consistent view, never straddling a merge.
fn read_cached<S: CacheStore>(store: &S) -> Result<SyncSnapshot> {
  store.read(|r| {
    Ok(SyncSnapshot {
      friends: r.fetch_all()?,
      groups: r.fetch_all()?,
      photos: Vec::new(),
      origin: SnapshotOrigin::Cache,
    })
  })
}

fn worker_failed(stage: &'static str, e: JoinError) -> SyncError {
  SyncError::Worker(format!("{} task failed: {}", stage, e))
}

/// Upsert friends and groups and stamp both sync markers in one transaction.
fn merge_snapshot<S: CacheStore>(
  store: &S,
  snapshot: &SyncSnapshot,
  policy: MergePolicy,
  digest: &str,
) -> Result<MergeReport> {
  let synced_at = Utc::now();

  store.write(|w| {
    let friends = w.upsert(&snapshot.friends, policy)?;
    let groups = w.upsert(&snapshot.groups, policy)?;
    w.set_sync_marker(FriendRecord::entity_type(), synced_at, Some(digest))?;
    w.set_sync_marker(GroupRecord::entity_type(), synced_at, Some(digest))?;
    Ok(MergeReport { friends, groups })
  })
}
