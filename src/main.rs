use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use edgecache::fetch::HttpFetcher;
use edgecache::{CacheManager, Command as CacheCommand, SqliteStore, Whitelist};

#[derive(Parser, Debug)]
#[command(name = "edgecache")]
#[command(about = "Maintenance commands for the edge cache store")]
#[command(version)]
struct Args {
  /// Path to whitelist config file (default: $XDG_CONFIG_HOME/edgecache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Path to the cache database (default: platform data dir)
  #[arg(long)]
  db: Option<PathBuf>,

  /// Origin served by the host application
  #[arg(long, default_value = "http://localhost")]
  origin: String,

  #[command(subcommand)]
  command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// List partitions currently present in the store
  Partitions,
  /// Garbage-collect partitions not in the whitelist
  Gc,
  /// Delete every partition immediately
  Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let args = Args::parse();

  let whitelist = Whitelist::load(args.config.as_deref())?;
  let store = match &args.db {
    Some(path) => SqliteStore::open_at(path)?,
    None => SqliteStore::open()?,
  };
  let origin =
    Url::parse(&args.origin).map_err(|e| eyre!("Invalid origin {}: {}", args.origin, e))?;

  let manager = CacheManager::new(
    Arc::new(store),
    Arc::new(HttpFetcher::new()?),
    whitelist,
    &origin,
  );

  match args.command {
    Cmd::Partitions => {
      for name in manager.partitions()? {
        println!("{name}");
      }
    }
    Cmd::Gc => manager.dispatch(CacheCommand::Activate)?,
    Cmd::Clear => manager.dispatch(CacheCommand::ClearAllCaches)?,
  }

  Ok(())
}
