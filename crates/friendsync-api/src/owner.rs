//! The [`Owner`] extractor.
//!
//! Authentication happens upstream; whatever sits in front of this router
//! sets [`OWNER_HEADER`] to the caller's opaque id.

use axum::{extract::FromRequestParts, http::request::Parts};
use friendsync_core::friend::OwnerId;

use crate::error::ApiError;

pub const OWNER_HEADER: &str = "x-owner-id";

/// The calling owner. Rejects with 401 if the header is missing or blank.
#[derive(Debug, Clone)]
pub struct Owner(pub OwnerId);

impl<St: Send + Sync> FromRequestParts<St> for Owner {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    let id = parts
      .headers
      .get(OWNER_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
      .ok_or(ApiError::Unauthorized)?;
    Ok(Owner(OwnerId::new(id)))
  }
}
