use crate::sync::GroupRecord;
use crate::ui::renderfns::truncate;
use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::ListItem;

pub fn draw_groups(
  frame: &mut Frame,
  area: Rect,
  groups: &[GroupRecord],
  selected: usize,
  theme: &Theme,
) {
  let title = format!(" Groups ({}) ", groups.len());

  let items: Vec<ListItem> = groups
    .iter()
    .map(|group| {
      let description = group.description.as_deref().unwrap_or("");

      let line = Line::from(vec![
        Span::styled(
          format!("{:<24}", truncate(&group.name, 24)),
          Style::default().fg(theme.accent),
        ),
        Span::raw(" "),
        Span::styled(
          format!("{:>6} members", group.members_count),
          Style::default().fg(theme.muted),
        ),
        Span::raw("  "),
        Span::styled(truncate(description, 60), Style::default().fg(theme.fg)),
      ]);
      ListItem::new(line)
    })
    .collect();

  super::draw_list(
    frame,
    area,
    title,
    items,
    selected,
    "No groups yet. Press 'r' to refresh.",
    theme,
  );
}
