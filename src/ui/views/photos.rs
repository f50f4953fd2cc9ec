use crate::sync::PhotoRecord;
use crate::ui::renderfns::truncate;
use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::ListItem;

pub fn draw_photos(
  frame: &mut Frame,
  area: Rect,
  photos: &[PhotoRecord],
  selected: usize,
  theme: &Theme,
) {
  let title = format!(" Photos ({}) ", photos.len());

  let items: Vec<ListItem> = photos
    .iter()
    .map(|photo| {
      let line = Line::from(vec![
        Span::styled(format!("#{:<8}", photo.id), Style::default().fg(theme.accent)),
        Span::raw(" "),
        Span::styled(truncate(&photo.url, 90), Style::default().fg(theme.fg)),
      ]);
      ListItem::new(line)
    })
    .collect();

  // Photos only exist in memory, so they are empty until a refresh succeeds
  super::draw_list(
    frame,
    area,
    title,
    items,
    selected,
    "Photos are not cached. They appear after a successful refresh.",
    theme,
  );
}
