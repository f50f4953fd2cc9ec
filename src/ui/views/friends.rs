use crate::sync::FriendRecord;
use crate::ui::renderfns::truncate;
use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::ListItem;

pub fn draw_friends(
  frame: &mut Frame,
  area: Rect,
  friends: &[FriendRecord],
  selected: usize,
  theme: &Theme,
) {
  let online = friends.iter().filter(|f| f.is_online).count();
  let title = format!(" Friends ({} online / {}) ", online, friends.len());

  let items: Vec<ListItem> = friends
    .iter()
    .map(|friend| {
      let (marker, color) = if friend.is_online {
        ("●", theme.online)
      } else {
        ("○", theme.muted)
      };

      let line = Line::from(vec![
        Span::styled(format!("{} ", marker), Style::default().fg(color)),
        Span::styled(
          format!("{:<28}", truncate(&friend.name, 28)),
          Style::default().fg(theme.fg),
        ),
        Span::raw(" "),
        Span::styled(
          truncate(&friend.avatar_url, 60),
          Style::default().fg(theme.muted),
        ),
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
    "No friends yet. Press 'r' to refresh.",
    theme,
  );
}
