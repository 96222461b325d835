//! Handlers for `/meetings` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/meetings` | Body: [`NewMeeting`]; 404 if the friend is not the caller's |
//! | `PATCH`  | `/meetings/{id}` | Body: [`MeetingPatch`] |
//! | `DELETE` | `/meetings/{id}` | 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use friendsync_core::{
  meeting::{Meeting, MeetingPatch, NewMeeting},
  service::FriendService,
  store::ContactStore,
};
use uuid::Uuid;

use crate::{error::ApiError, owner::Owner};

/// `POST /meetings`: returns 201 + the stored meeting.
pub async fn create<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Json(body): Json<NewMeeting>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContactStore + 'static,
{
  let meeting = service.log_meeting(&owner, body).await?;
  Ok((StatusCode::CREATED, Json(meeting)))
}

/// `PATCH /meetings/{id}`
pub async fn update<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
  Json(patch): Json<MeetingPatch>,
) -> Result<Json<Meeting>, ApiError>
where
  S: ContactStore + 'static,
{
  let meeting = service
    .update_meeting(&owner, id, patch)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("meeting {id} not found")))?;
  Ok(Json(meeting))
}

/// `DELETE /meetings/{id}`
pub async fn delete<S>(
  State(service): State<FriendService<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore + 'static,
{
  if service.delete_meeting(&owner, id).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("meeting {id} not found")))
  }
}
