//! [`FriendService`]: the operations callers invoke, over any
//! [`ContactStore`].
//!
//! The service holds no mutable state between calls. Every operation takes
//! the caller's [`OwnerId`](crate::friend::OwnerId) and a `now` explicitly, so
//! it can be exercised without a request framework or a real clock.

mod directory;
mod reminders;

use std::sync::Arc;

use crate::{ServiceError, config::ReminderConfig, store::ContactStore};

pub use reminders::{MAX_BULK_IDS, MarkContacted, OverdueSummary};

type ServiceResult<T, S> = Result<T, ServiceError<<S as ContactStore>::Error>>;

/// Runs the reminder pipeline and friend/meeting management against a store.
///
/// Cloning is cheap; the store is reference-counted.
pub struct FriendService<S> {
  store:  Arc<S>,
  config: ReminderConfig,
}

impl<S> Clone for FriendService<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: self.config.clone() }
  }
}

impl<S: ContactStore> FriendService<S> {
  pub fn new(store: Arc<S>, config: ReminderConfig) -> Self {
    Self { store, config }
  }
}
