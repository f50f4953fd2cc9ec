mod app;
mod cache;
mod config;
mod event;
mod logging;
mod sync;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use cache::SqliteStore;
use sync::{HttpFetcher, SyncPipeline, SyncSnapshot, SyncStatus};

#[derive(Parser, Debug)]
#[command(name = "friendsync")]
#[command(about = "Fetch, cache and browse a friends/groups/photos feed")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/friendsync/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Feed URL, overriding source.url from the config
  #[arg(short, long, global = true)]
  source: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
  /// Browse friends, groups and photos interactively (default)
  Tui,
  /// Fetch the feed once and update the cache
  Refresh,
  /// Print what is currently cached
  Show,
  /// Delete all cached friends and groups
  Clear,
  /// Show when the cache was last synced
  Status,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let command = args.command.unwrap_or(Command::Tui);

  let _log_guard = logging::init(if command == Command::Tui {
    logging::LogTarget::File
  } else {
    logging::LogTarget::Stderr
  })?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override source if specified on command line
  if let Some(source) = args.source {
    config.source.url = Some(source);
  }

  let store = match &config.cache.path {
    Some(path) => SqliteStore::open(path)?,
    None => SqliteStore::open_default()?,
  };
  let fetcher = HttpFetcher::new(config.timeout())?;
  let pipeline =
    Arc::new(SyncPipeline::new(Arc::new(store), fetcher).with_merge_policy(config.cache.merge_policy));

  match command {
    Command::Tui => {
      // Without a source the TUI still shows whatever is cached
      let source = config.source.url.clone();
      let mut app = app::App::new(&config, source, pipeline);
      app.run().await?;
    }
    Command::Refresh => {
      let source = config.source_url()?;
      let snapshot = pipeline.refresh(source).await?;
      println!(
        "Fetched {} friends ({} online), {} groups, {} photos",
        snapshot.friends.len(),
        snapshot.online_friends(),
        snapshot.groups.len(),
        snapshot.photos.len()
      );
    }
    Command::Show => {
      let snapshot = pipeline.load_initial().await;
      print_snapshot(&snapshot);
    }
    Command::Clear => {
      pipeline.clear_cache().await;
      println!("Cache cleared");
    }
    Command::Status => {
      let status = pipeline.sync_status().await?;
      print_status(&status);
    }
  }

  Ok(())
}

fn print_snapshot(snapshot: &SyncSnapshot) {
  if snapshot.is_empty() {
    println!("Cache is empty. Run `friendsync refresh` first.");
    return;
  }

  println!("Friends ({}):", snapshot.friends.len());
  for friend in &snapshot.friends {
    let marker = if friend.is_online { "online" } else { "offline" };
    println!("  {:>6}  {:<30} {}", friend.id, friend.name, marker);
  }

  println!("Groups ({}):", snapshot.groups.len());
  for group in &snapshot.groups {
    println!(
      "  {:>6}  {:<30} {} members  {}",
      group.id,
      group.name,
      group.members_count,
      group.description.as_deref().unwrap_or("-")
    );
  }
}

fn print_status(status: &SyncStatus) {
  for (label, marker) in [("friends", &status.friends), ("groups", &status.groups)] {
    match marker {
      Some(m) => println!(
        "{:<8} last synced {} (payload {})",
        m.entity_type,
        m.last_synced_at.to_rfc3339(),
        m.payload_digest.as_deref().map(|d| &d[..d.len().min(12)]).unwrap_or("-")
      ),
      None => println!("{:<8} never synced", label),
    }
  }
}
