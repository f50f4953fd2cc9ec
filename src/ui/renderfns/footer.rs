use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::StatusMessage;
use crate::ui::Theme;

const HINTS: &str = " 1-3/Tab:switch  j/k:nav  r:refresh  x:clear cache  t:theme  q:quit";

/// Draw the status bar: the latest message, or key hints when there is none
pub fn draw_footer(frame: &mut Frame, area: Rect, status: Option<&StatusMessage>, theme: &Theme) {
  let (content, style) = match status {
    Some(StatusMessage::Info(msg)) => (format!(" {}", msg), Style::default().fg(theme.warning)),
    Some(StatusMessage::Error(msg)) => (format!(" {}", msg), Style::default().fg(theme.error).bold()),
    None => (HINTS.to_string(), Style::default().fg(theme.muted)),
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}
