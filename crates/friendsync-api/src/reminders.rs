//! Handlers for `/reminders` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reminders/summary` | Every overdue friend in the candidate window |
//! | `GET`  | `/reminders/overdue` | Optional `?take=` (1–50, default 20) and `?skip=` |
//! | `GET`  | `/reminders/stats` | Dashboard counters |
//! | `POST` | `/reminders/mark-contacted` | Body: `{"friend_ids":[...],"expected_versions":{...}}` |

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use chrono::Utc;
use friendsync_core::{
  friend::Friend,
  paginate::{PageRequest, PageResult},
  service::{FriendService, MarkContacted, OverdueSummary},
  stats::StatsSnapshot,
  store::ContactStore,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, owner::Owner};

// ─── Summary ──────────────────────────────────────────────────────────────────

/// `GET /reminders/summary`
pub async fn summary<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
) -> Result<Json<OverdueSummary>, ApiError>
where
  S: ContactStore + 'static,
{
  let summary = service.overdue_summary(&owner, Utc::now()).await?;
  Ok(Json(summary))
}

// ─── Overdue page ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PageParams {
  pub take: Option<usize>,
  pub skip: Option<usize>,
}

/// `GET /reminders/overdue[?take=<n>][&skip=<n>]`
pub async fn overdue<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<PageResult>, ApiError>
where
  S: ContactStore + 'static,
{
  let Query(params) = params?;
  let page = PageRequest::new(params.take, params.skip)?;
  let result = service.list_overdue(&owner, page, Utc::now()).await?;
  Ok(Json(result))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /reminders/stats`
pub async fn stats<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
) -> Result<Json<StatsSnapshot>, ApiError>
where
  S: ContactStore + 'static,
{
  let stats = service.stats(&owner, Utc::now()).await?;
  Ok(Json(stats))
}

// ─── Mark contacted ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MarkContactedResponse {
  /// Number of friends actually updated; ids that matched nothing are not
  /// counted.
  pub updated: usize,
  pub friends: Vec<Friend>,
}

/// `POST /reminders/mark-contacted`
pub async fn mark_contacted<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Json(body): Json<MarkContacted>,
) -> Result<Json<MarkContactedResponse>, ApiError>
where
  S: ContactStore + 'static,
{
  let friends = service.bulk_mark_contacted(&owner, body, Utc::now()).await?;
  Ok(Json(MarkContactedResponse { updated: friends.len(), friends }))
}
