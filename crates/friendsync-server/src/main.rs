//! friendsync server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `FRIENDSYNC__*` environment variables, opens the SQLite store, and serves
//! the JSON API.
//!
//! # Demo data
//!
//! ```sh
//! cargo run -p friendsync-server -- --seed --seed-owner zoey
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use friendsync_core::{friend::OwnerId, service::FriendService};
use friendsync_server::{ServerConfig, seed::seed};
use friendsync_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "FriendSync reminder server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Replace the seed owner's friends with demo data and exit.
  #[arg(long)]
  seed: bool,

  /// Owner id the demo data is created for.
  #[arg(long, default_value = "demo")]
  seed_owner: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("FRIENDSYNC")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg
    .reminders
    .validate()
    .context("invalid [reminders] configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let service = FriendService::new(Arc::new(store), server_cfg.reminders.clone());

  if cli.seed {
    let owner = OwnerId::new(cli.seed_owner);
    let added = seed(&service, &owner).await.context("failed to seed demo data")?;
    println!("seeded {} friends for {owner}", added.len());
    return Ok(());
  }

  let app = friendsync_server::app(service);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
