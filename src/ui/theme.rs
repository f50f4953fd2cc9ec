use ratatui::prelude::Color;

use crate::config::ThemeName;

/// Colors used by every renderer. Passed down explicitly; there is no global theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
  pub name: ThemeName,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub highlight_bg: Color,
  pub online: Color,
  pub warning: Color,
  pub error: Color,
}

impl Theme {
  pub fn from_name(name: ThemeName) -> Self {
    match name {
      ThemeName::Dark => Theme {
        name,
        bg: Color::Black,
        fg: Color::White,
        muted: Color::DarkGray,
        accent: Color::Cyan,
        border: Color::Blue,
        highlight_bg: Color::DarkGray,
        online: Color::Green,
        warning: Color::Yellow,
        error: Color::Red,
      },
      ThemeName::Light => Theme {
        name,
        bg: Color::White,
        fg: Color::Black,
        muted: Color::Gray,
        accent: Color::Blue,
        border: Color::DarkGray,
        highlight_bg: Color::Gray,
        online: Color::Green,
        warning: Color::Magenta,
        error: Color::Red,
      },
      ThemeName::Ocean => Theme {
        name,
        bg: Color::Rgb(10, 25, 47),
        fg: Color::Rgb(204, 214, 246),
        muted: Color::Rgb(136, 146, 176),
        accent: Color::Rgb(100, 255, 218),
        border: Color::Rgb(35, 53, 84),
        highlight_bg: Color::Rgb(23, 42, 69),
        online: Color::Rgb(100, 255, 218),
        warning: Color::Rgb(255, 203, 107),
        error: Color::Rgb(255, 85, 85),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_theme_keeps_its_name() {
    for name in [ThemeName::Dark, ThemeName::Light, ThemeName::Ocean] {
      assert_eq!(Theme::from_name(name).name, name);
    }
  }

  #[test]
  fn test_themes_differ() {
    assert_ne!(
      Theme::from_name(ThemeName::Dark).bg,
      Theme::from_name(ThemeName::Light).bg
    );
  }
}
