use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::MergePolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub source: SourceConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Initial color theme; can be cycled at runtime
  #[serde(default)]
  pub theme: ThemeName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
  /// URL of the JSON feed with friends, groups and photos
  pub url: Option<String>,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      url: None,
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  15
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Database file (defaults to $XDG_DATA_HOME/friendsync/cache.db)
  pub path: Option<PathBuf>,
  /// What a refresh does with cached fields the feed never sends
  #[serde(default)]
  pub merge_policy: MergePolicy,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
  #[default]
  Dark,
  Light,
  Ocean,
}

impl ThemeName {
  pub fn next(self) -> Self {
    match self {
      ThemeName::Dark => ThemeName::Light,
      ThemeName::Light => ThemeName::Ocean,
      ThemeName::Ocean => ThemeName::Dark,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ThemeName::Dark => "dark",
      ThemeName::Light => "light",
      ThemeName::Ocean => "ocean",
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./friendsync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/friendsync/config.yaml
  ///
  /// Without any file, defaults are used and the source must come from `--source`.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("friendsync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("friendsync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Get the feed URL, or explain how to set one.
  pub fn source_url(&self) -> Result<&str> {
    self.source.url.as_deref().ok_or_else(|| {
      eyre!(
        "No feed source configured. Set source.url in ~/.config/friendsync/config.yaml \
         or pass --source <URL>."
      )
    })
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.source.timeout_secs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_full_config() {
    let config = Config::from_yaml(
      r#"
source:
  url: https://example.com/feed.json
  timeout_secs: 3
cache:
  path: /tmp/fs.db
  merge_policy: preserve_local
theme: ocean
"#,
    )
    .unwrap();

    assert_eq!(config.source_url().unwrap(), "https://example.com/feed.json");
    assert_eq!(config.timeout(), Duration::from_secs(3));
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/fs.db")));
    assert_eq!(config.cache.merge_policy, MergePolicy::PreserveLocal);
    assert_eq!(config.theme, ThemeName::Ocean);
  }

  #[test]
  fn test_defaults() {
    let config = Config::from_yaml("source:\n  url: http://localhost/f\n").unwrap();
    assert_eq!(config.source.timeout_secs, 15);
    assert_eq!(config.cache.merge_policy, MergePolicy::Overwrite);
    assert_eq!(config.theme, ThemeName::Dark);
  }

  #[test]
  fn test_empty_file_is_default() {
    let config = Config::from_yaml("  \n").unwrap();
    assert!(config.source_url().is_err());
  }

  #[test]
  fn test_unknown_theme_is_rejected() {
    assert!(Config::from_yaml("theme: neon\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let missing = Path::new("/definitely/not/here/friendsync.yaml");
    assert!(Config::load(Some(missing)).is_err());
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "theme: light\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.theme, ThemeName::Light);
  }

  #[test]
  fn test_theme_cycle() {
    assert_eq!(ThemeName::Dark.next().next().next(), ThemeName::Dark);
  }
}
