use std::future::Future;
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use url::Url;

use super::error::{SyncError, TransportError};

/// Something that can retrieve the raw feed document.
pub trait Fetcher: Send + Sync + 'static {
  /// GET `url` and return the body of a success response.
  ///
  /// Any status but 200 maps to [`SyncError::ServerStatus`], everything that
  /// prevents a response from arriving maps to [`SyncError::Transport`].
  fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, SyncError>> + Send;
}

/// Feed client over HTTP(S)
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("friendsync/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl Fetcher for HttpFetcher {
  fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, SyncError>> + Send {
    let request = self.client.get(url.clone());

    async move {
      let response = request.send().await.map_err(transport_error)?;

      let status = response.status();
      if status != reqwest::StatusCode::OK {
        return Err(SyncError::ServerStatus(status.as_u16()));
      }

      let body = response.bytes().await.map_err(transport_error)?;
      Ok(body.to_vec())
    }
  }
}

fn transport_error(e: reqwest::Error) -> SyncError {
  let cause = if e.is_timeout() {
    TransportError::Timeout
  } else if e.is_connect() {
    TransportError::Connect(e.to_string())
  } else {
    TransportError::Other(e.to_string())
  };
  SyncError::Transport(cause)
}
