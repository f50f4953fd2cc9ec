use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::App;
use crate::sync::{RefreshPhase, SnapshotOrigin};
use crate::ui::Theme;

/// Draw the header bar with logo, source host, data freshness and refresh phase
pub fn draw_header(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
  let host = app.source().map_or("no source", extract_host);

  let freshness = match (app.snapshot().origin, app.last_synced()) {
    (SnapshotOrigin::Network, Some(at)) => format!(" live, synced {} ", at.format("%H:%M:%S")),
    (SnapshotOrigin::Network, None) => " live ".to_string(),
    (SnapshotOrigin::Cache, _) => " cached ".to_string(),
  };

  let phase = match app.phase() {
    RefreshPhase::Idle => Span::raw(""),
    busy => Span::styled(format!(" {}... ", busy.label()), Style::default().fg(theme.warning)),
  };

  let header = Line::from(vec![
    Span::styled(" friendsync ", Style::default().fg(theme.accent).bold()),
    Span::styled("│", Style::default().fg(theme.muted)),
    Span::styled(format!(" {} ", host), Style::default().fg(theme.fg)),
    Span::styled("│", Style::default().fg(theme.muted)),
    Span::styled(freshness, Style::default().fg(theme.muted)),
    phase,
    Span::styled(
      format!(" [{}]", theme.name.label()),
      Style::default().fg(theme.muted),
    ),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(theme.highlight_bg));

  frame.render_widget(paragraph, area);
}

/// Extract host (and port) from a feed URL
fn extract_host(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_host() {
    assert_eq!(
      extract_host("https://feeds.example.com/friends.json"),
      "feeds.example.com"
    );
    assert_eq!(extract_host("http://localhost:8080"), "localhost:8080");
    assert_eq!(extract_host("not-a-url"), "not-a-url");
  }
}
