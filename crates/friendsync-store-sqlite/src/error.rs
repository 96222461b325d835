//! Error type for `friendsync-store-sqlite`.

use friendsync_core::{ErrorKind, StoreError};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] friendsync_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value outside its domain.
  #[error("invalid stored value: {0}")]
  InvalidValue(String),
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => {
        match e.sqlite_error_code() {
          Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            ErrorKind::Transient
          }
          Some(ErrorCode::ConstraintViolation) => ErrorKind::Invalid,
          _ => ErrorKind::Other,
        }
      }
      _ => ErrorKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
