//! FriendSync server: configuration and application assembly.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the store, and
//! serves [`app`].

pub mod seed;

use std::path::PathBuf;

use axum::{Router, routing::get};
use friendsync_core::{config::ReminderConfig, service::FriendService, store::ContactStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FRIENDSYNC__*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub reminders:  ReminderConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/friendsync/friendsync.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api`, a liveness probe, and
/// request tracing.
pub fn app<S>(service: FriendService<S>) -> Router
where
  S: ContactStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", friendsync_api::api_router(service))
    .layer(TraceLayer::new_for_http())
}
