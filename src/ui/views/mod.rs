mod friends;
mod groups;
mod photos;

pub use friends::draw_friends;
pub use groups::draw_groups;
pub use photos::draw_photos;

use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Render a bordered, selectable list, or a placeholder when it is empty
fn draw_list(
  frame: &mut Frame,
  area: Rect,
  title: String,
  items: Vec<ListItem>,
  selected: usize,
  empty_message: &str,
  theme: &Theme,
) {
  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(theme.border));

  if items.is_empty() {
    let paragraph = Paragraph::new(empty_message)
      .block(block)
      .style(Style::default().fg(theme.muted));
    frame.render_widget(paragraph, area);
    return;
  }

  let mut state = ListState::default().with_selected(Some(selected));

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(theme.highlight_bg)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(list, area, &mut state);
}
