//! Handlers for `/friends` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/friends` | Most recently contacted first, with recent meetings |
//! | `POST`   | `/friends` | Body: [`NewFriend`]; returns 201 |
//! | `GET`    | `/friends/{id}` | 404 if missing or not the caller's |
//! | `PATCH`  | `/friends/{id}` | Body: [`FriendPatch`] |
//! | `DELETE` | `/friends/{id}` | 204; meetings go with it |
//! | `GET`    | `/friends/{id}/meetings` | Newest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use friendsync_core::{
  friend::{Friend, FriendDetail, FriendPatch, NewFriend},
  meeting::Meeting,
  service::FriendService,
  store::ContactStore,
};
use uuid::Uuid;

use crate::{error::ApiError, owner::Owner};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("friend {id} not found")) }

/// `GET /friends`
pub async fn list<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
) -> Result<Json<Vec<FriendDetail>>, ApiError>
where
  S: ContactStore + 'static,
{
  Ok(Json(service.list_friends(&owner).await?))
}

/// `POST /friends`
pub async fn create<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Json(body): Json<NewFriend>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContactStore + 'static,
{
  let friend = service.add_friend(&owner, body).await?;
  Ok((StatusCode::CREATED, Json(friend)))
}

/// `GET /friends/{id}`
pub async fn get_one<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<Json<FriendDetail>, ApiError>
where
  S: ContactStore + 'static,
{
  let friend = service
    .get_friend(&owner, id)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(friend))
}

/// `PATCH /friends/{id}`
pub async fn update<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
  Json(patch): Json<FriendPatch>,
) -> Result<Json<Friend>, ApiError>
where
  S: ContactStore + 'static,
{
  let friend = service
    .update_friend(&owner, id, patch)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(friend))
}

/// `DELETE /friends/{id}`
pub async fn delete<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore + 'static,
{
  if service.delete_friend(&owner, id).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(not_found(id))
  }
}

/// `GET /friends/{id}/meetings`
///
/// An unknown friend yields an empty list rather than 404; the store does not
/// distinguish the two.
pub async fn meetings<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Meeting>>, ApiError>
where
  S: ContactStore + 'static,
{
  Ok(Json(service.list_meetings(&owner, id).await?))
}
