//! Error types for `friendsync-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or out-of-range input. Raised before any storage access.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("friend not found: {0}")]
  FriendNotFound(Uuid),

  #[error(
    "friend {friend_id} was modified concurrently (expected version \
     {expected}, found {actual})"
  )]
  VersionConflict {
    friend_id: Uuid,
    expected:  i64,
    actual:    i64,
  },
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Store error classification ──────────────────────────────────────────────

/// Coarse classification of a storage failure.
///
/// The service layer uses it to decide whether a read may be retried; the API
/// layer uses it to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Contention or a temporarily unavailable backend. Safe to retry reads.
  Transient,
  NotFound,
  Conflict,
  Invalid,
  Other,
}

/// Implemented by every backend's error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Validation(_) => ErrorKind::Invalid,
      Error::FriendNotFound(_) => ErrorKind::NotFound,
      Error::VersionConflict { .. } => ErrorKind::Conflict,
    }
  }
}

// ─── Service error ───────────────────────────────────────────────────────────

/// Error returned by [`crate::service::FriendService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError<E: StoreError> {
  #[error(transparent)]
  Core(#[from] Error),

  /// A storage failure, propagated unmodified. A failed bulk transaction
  /// surfaces here as a single error; nothing was committed.
  #[error("store error: {0}")]
  Store(#[source] E),
}

impl<E: StoreError> ServiceError<E> {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ServiceError::Core(e) => e.kind(),
      ServiceError::Store(e) => e.kind(),
    }
  }
}
