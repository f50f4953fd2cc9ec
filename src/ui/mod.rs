mod renderfns;
mod theme;
mod views;

pub use theme::Theme;

use crate::app::{App, Tab};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Tabs};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let theme = Theme::from_name(app.theme());

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg).fg(theme.fg)), frame.area());

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(1), // Tabs
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], app, &theme);
  draw_tabs(frame, chunks[1], app, &theme);

  let snapshot = app.snapshot();
  match app.tab() {
    Tab::Friends => views::draw_friends(frame, chunks[2], &snapshot.friends, app.selected(), &theme),
    Tab::Groups => views::draw_groups(frame, chunks[2], &snapshot.groups, app.selected(), &theme),
    Tab::Photos => views::draw_photos(frame, chunks[2], &snapshot.photos, app.selected(), &theme),
  }

  renderfns::draw_footer(frame, chunks[3], app.status(), &theme);
}

fn draw_tabs(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
  let snapshot = app.snapshot();
  let counts = [
    snapshot.friends.len(),
    snapshot.groups.len(),
    snapshot.photos.len(),
  ];

  let titles: Vec<Line> = Tab::ALL
    .iter()
    .zip(counts)
    .enumerate()
    .map(|(i, (tab, count))| Line::from(format!(" {} {} ({}) ", i + 1, tab.title(), count)))
    .collect();

  let selected = Tab::ALL.iter().position(|t| *t == app.tab()).unwrap_or(0);

  let tabs = Tabs::new(titles)
    .select(selected)
    .style(Style::default().fg(theme.muted))
    .highlight_style(Style::default().fg(theme.accent).bold())
    .divider(Span::styled("│", Style::default().fg(theme.muted)));

  frame.render_widget(tabs, area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::Pipeline;
  use crate::cache::SqliteStore;
  use crate::config::Config;
  use crate::sync::{HttpFetcher, SyncPipeline};
  use ratatui::backend::TestBackend;
  use std::sync::Arc;
  use std::time::Duration;

  fn render(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
    terminal.draw(|frame| draw(frame, app)).unwrap();

    let buffer = terminal.backend().buffer();
    buffer
      .content()
      .chunks(buffer.area.width as usize)
      .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
      .collect::<Vec<_>>()
      .join("\n")
  }

  fn pipeline() -> Arc<Pipeline> {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
    Arc::new(SyncPipeline::new(store, fetcher))
  }

  #[test]
  fn test_empty_cache_renders_placeholder() {
    let app = App::new(
      &Config::default(),
      Some("https://feeds.example.com/f.json".into()),
      pipeline(),
    );

    let screen = render(&app);
    assert!(screen.contains("friendsync"));
    assert!(screen.contains("feeds.example.com"));
    assert!(screen.contains("cached"));
    assert!(screen.contains("No friends yet"));
    assert!(screen.contains("1 Friends (0)"));
  }

  #[test]
  fn test_header_without_source() {
    let app = App::new(&Config::default(), None, pipeline());

    let screen = render(&app);
    assert!(screen.contains("no source"));
  }
}
