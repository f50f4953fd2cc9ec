//! Error types for the sync pipeline.

/// Why a refresh did not produce a snapshot.
///
/// No variant is ever returned after the cache has been modified: every
/// failure leaves the durable cache exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
  /// The source is not an absolute http(s) URL. No request was made.
  #[error("invalid source '{url}': {reason}")]
  InvalidSource { url: String, reason: String },

  /// The request never produced a response.
  #[error("transport failure: {0}")]
  Transport(#[from] TransportError),

  /// The server answered with a status other than 200.
  #[error("server responded with status {0}")]
  ServerStatus(u16),

  /// A response body arrived but does not match the feed schema.
  #[error("malformed payload: {0}")]
  MalformedPayload(#[from] DecodeError),

  /// Another refresh on the same pipeline has not finished yet.
  #[error("a refresh is already in progress")]
  AlreadyInProgress,

  /// The merge transaction failed and was rolled back.
  #[error("cache write failed: {0}")]
  Storage(String),

  /// A background decode or merge task panicked or was shut down.
  #[error("background {0}")]
  Worker(String),
}

impl SyncError {
  pub(crate) fn invalid_source(url: &str, reason: impl Into<String>) -> Self {
    Self::InvalidSource {
      url: url.to_string(),
      reason: reason.into(),
    }
  }

  /// Whether retrying the same request later could plausibly succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      Self::Transport(_) | Self::AlreadyInProgress => true,
      Self::ServerStatus(code) => *code >= 500 || *code == 408 || *code == 429,
      Self::InvalidSource { .. }
      | Self::MalformedPayload(_)
      | Self::Storage(_)
      | Self::Worker(_) => false,
    }
  }

  /// Short machine-friendly name, used in logs
  pub fn kind(&self) -> &'static str {
    match self {
      Self::InvalidSource { .. } => "invalid_source",
      Self::Transport(_) => "transport",
      Self::ServerStatus(_) => "server_status",
      Self::MalformedPayload(_) => "malformed_payload",
      Self::AlreadyInProgress => "already_in_progress",
      Self::Storage(_) => "storage",
      Self::Worker(_) => "worker",
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
  #[error("request timed out")]
  Timeout,
  #[error("connection failed: {0}")]
  Connect(String),
  #[error("{0}")]
  Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  #[error("unsupported payload version {0}")]
  UnsupportedVersion(u32),
  #[error("duplicate {entity} id {id}")]
  DuplicateId { entity: &'static str, id: i64 },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_retryable_classification() {
    assert!(SyncError::Transport(TransportError::Timeout).is_retryable());
    assert!(SyncError::ServerStatus(503).is_retryable());
    assert!(SyncError::ServerStatus(429).is_retryable());
    assert!(!SyncError::ServerStatus(404).is_retryable());
    assert!(!SyncError::invalid_source("x", "bad").is_retryable());
    assert!(!SyncError::MalformedPayload(DecodeError::UnsupportedVersion(9)).is_retryable());
  }

  #[test]
  fn test_display_includes_cause() {
    let err = SyncError::Transport(TransportError::Connect("refused".into()));
    assert_eq!(err.to_string(), "transport failure: connection failed: refused");
    assert_eq!(SyncError::ServerStatus(500).to_string(), "server responded with status 500");
  }
}
