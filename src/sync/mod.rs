pub mod api_types;
pub mod cache;
pub mod client;
pub mod error;
pub mod pipeline;
pub mod types;

pub use client::{Fetcher, HttpFetcher};
pub use error::SyncError;
pub use pipeline::{SyncPipeline, SyncStatus};
pub use types::{FriendRecord, GroupRecord, PhotoRecord, RefreshPhase, SnapshotOrigin, SyncSnapshot};
