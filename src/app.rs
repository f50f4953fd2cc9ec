use crate::cache::SqliteStore;
use crate::config::{Config, ThemeName};
use crate::event::{self, Event, EventHandler};
use crate::sync::{HttpFetcher, RefreshPhase, SyncError, SyncPipeline, SyncSnapshot};
use crate::ui;
use chrono::{DateTime, Local};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type Pipeline = SyncPipeline<SqliteStore, HttpFetcher>;

/// Top-level tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  Friends,
  Groups,
  Photos,
}

impl Tab {
  pub const ALL: [Tab; 3] = [Tab::Friends, Tab::Groups, Tab::Photos];

  pub fn title(self) -> &'static str {
    match self {
      Tab::Friends => "Friends",
      Tab::Groups => "Groups",
      Tab::Photos => "Photos",
    }
  }

  fn index(self) -> usize {
    match self {
      Tab::Friends => 0,
      Tab::Groups => 1,
      Tab::Photos => 2,
    }
  }

  fn next(self) -> Self {
    Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
  }

  fn previous(self) -> Self {
    Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
  }
}

/// One-line message shown in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
  Info(String),
  Error(String),
}

/// Main application state
pub struct App {
  pipeline: Arc<Pipeline>,

  /// Feed URL refreshes are issued against; without one only the cache is shown
  source: Option<String>,

  /// Latest snapshot published by the pipeline
  snapshot: Arc<SyncSnapshot>,

  phase: RefreshPhase,

  tab: Tab,

  /// Selected row per tab
  selected: [usize; 3],

  theme: ThemeName,

  status: Option<StatusMessage>,

  last_synced: Option<DateTime<Local>>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Refresh tasks that may still be running, aborted on quit
  refresh_tasks: Vec<JoinHandle<()>>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, source: Option<String>, pipeline: Arc<Pipeline>) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    Self {
      pipeline,
      source,
      snapshot: Arc::new(SyncSnapshot::default()),
      phase: RefreshPhase::Idle,
      tab: Tab::Friends,
      selected: [0; 3],
      theme: config.theme,
      status: None,
      last_synced: None,
      event_tx: tx,
      refresh_tasks: Vec::new(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    event::forward_watch(self.pipeline.subscribe(), self.event_tx.clone(), Event::Snapshot);
    event::forward_watch(self.pipeline.watch_phase(), self.event_tx.clone(), Event::Phase);

    // Cached data first, then one refresh
    self.load_initial_data();

    let result = self.event_loop(&mut terminal, &mut events).await;

    self.abort_refreshes();

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn load_initial_data(&mut self) {
    let pipeline = Arc::clone(&self.pipeline);
    let source = self.source.clone();
    let tx = self.event_tx.clone();

    if source.is_none() {
      self.status = Some(no_source_message());
    }

    self.refresh_tasks.push(tokio::spawn(async move {
      pipeline.load_initial().await;
      if let Some(source) = source {
        let result = pipeline.refresh(&source).await.map(|_| ());
        let _ = tx.send(Event::RefreshDone(result));
      }
    }));
  }

  fn start_refresh(&mut self) {
    let Some(source) = self.source.clone() else {
      self.status = Some(no_source_message());
      return;
    };
    let pipeline = Arc::clone(&self.pipeline);
    let tx = self.event_tx.clone();

    // The pipeline rejects duplicates, so any of these may be the live refresh
    self.refresh_tasks.retain(|task| !task.is_finished());
    self.refresh_tasks.push(tokio::spawn(async move {
      let result = pipeline.refresh(&source).await.map(|_| ());
      let _ = tx.send(Event::RefreshDone(result));
    }));
  }

  fn abort_refreshes(&mut self) {
    for task in self.refresh_tasks.drain(..) {
      task.abort();
    }
  }

  fn clear_cache(&self) {
    let pipeline = Arc::clone(&self.pipeline);
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      pipeline.clear_cache().await;
      let _ = tx.send(Event::CacheCleared);
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {} // UI refresh happens automatically
      Event::Snapshot(snapshot) => {
        self.snapshot = snapshot;
        self.clamp_selection();
      }
      Event::Phase(phase) => self.phase = phase,
      Event::RefreshDone(result) => self.handle_refresh_done(result),
      Event::CacheCleared => {
        self.last_synced = None;
        self.status = Some(StatusMessage::Info("Cache cleared".to_string()));
      }
      Event::ThemeChanged(theme) => {
        self.theme = theme;
        self.status = Some(StatusMessage::Info(format!("Theme: {}", theme.label())));
      }
    }
  }

  fn handle_refresh_done(&mut self, result: Result<(), SyncError>) {
    self.status = match result {
      Ok(()) => {
        self.last_synced = Some(Local::now());
        None
      }
      Err(SyncError::AlreadyInProgress) => Some(StatusMessage::Info(
        "Refresh already running".to_string(),
      )),
      Err(e) if e.is_retryable() => {
        Some(StatusMessage::Error(format!("{}. Press r to retry.", e)))
      }
      Err(e) => Some(StatusMessage::Error(e.to_string())),
    };
  }

  fn handle_key(&mut self, key: KeyEvent) {
    match key.code {
      // Quit
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      // Tabs
      KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.tab = self.tab.next(),
      KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.tab = self.tab.previous(),
      KeyCode::Char('1') => self.tab = Tab::Friends,
      KeyCode::Char('2') => self.tab = Tab::Groups,
      KeyCode::Char('3') => self.tab = Tab::Photos,

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),

      // Actions
      KeyCode::Char('r') => {
        self.status = None;
        self.start_refresh();
      }
      KeyCode::Char('x') => self.clear_cache(),
      KeyCode::Char('t') => {
        let _ = self.event_tx.send(Event::ThemeChanged(self.theme.next()));
      }

      _ => {}
    }
  }

  fn tab_len(&self, tab: Tab) -> usize {
    match tab {
      Tab::Friends => self.snapshot.friends.len(),
      Tab::Groups => self.snapshot.groups.len(),
      Tab::Photos => self.snapshot.photos.len(),
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.tab_len(self.tab);
    if len > 0 {
      let selected = &mut self.selected[self.tab.index()];
      *selected = (*selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  fn clamp_selection(&mut self) {
    for tab in Tab::ALL {
      let len = self.tab_len(tab);
      let selected = &mut self.selected[tab.index()];
      *selected = (*selected).min(len.saturating_sub(1));
    }
  }

  // Accessors for UI rendering
  pub fn snapshot(&self) -> &SyncSnapshot {
    &self.snapshot
  }

  pub fn tab(&self) -> Tab {
    self.tab
  }

  pub fn selected(&self) -> usize {
    self.selected[self.tab.index()]
  }

  pub fn phase(&self) -> RefreshPhase {
    self.phase
  }

  pub fn theme(&self) -> ThemeName {
    self.theme
  }

  pub fn source(&self) -> Option<&str> {
    self.source.as_deref()
  }

  pub fn status(&self) -> Option<&StatusMessage> {
    self.status.as_ref()
  }

  pub fn last_synced(&self) -> Option<DateTime<Local>> {
    self.last_synced
  }
}

fn no_source_message() -> StatusMessage {
  StatusMessage::Error("No source configured. Set source.url or pass --source.".to_string())
}
