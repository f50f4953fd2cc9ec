use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::config::ThemeName;
use crate::sync::{RefreshPhase, SyncError, SyncSnapshot};

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh
  Tick,
  /// The pipeline published a new snapshot
  Snapshot(Arc<SyncSnapshot>),
  /// The pipeline moved to another refresh phase
  Phase(RefreshPhase),
  /// A refresh finished
  RefreshDone(Result<(), SyncError>),
  /// The cache was cleared
  CacheCleared,
  /// The user picked another theme
  ThemeChanged(ThemeName),
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // crossterm polling blocks, so keep it off the async workers
    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
      let event = if event::poll(tick_rate).unwrap_or(false) {
        match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
          _ => continue,
        }
      } else {
        Event::Tick
      };

      if input_tx.send(event).is_err() {
        break;
      }
    });

    Self { tx, rx }
  }

  /// Get a sender for pushing events from async tasks
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

/// Forward every value published on a watch channel into the event stream.
///
/// This is how pipeline updates reach the UI loop, which owns all app state.
pub fn forward_watch<T, M>(mut rx: watch::Receiver<T>, tx: mpsc::UnboundedSender<Event>, map: M)
where
  T: Clone + Send + Sync + 'static,
  M: Fn(T) -> Event + Send + 'static,
{
  tokio::spawn(async move {
    while rx.changed().await.is_ok() {
      let value = rx.borrow_and_update().clone();
      if tx.send(map(value)).is_err() {
        break;
      }
    }
  });
}
