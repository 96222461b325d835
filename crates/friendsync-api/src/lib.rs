//! JSON REST API for FriendSync.
//!
//! Exposes an axum [`Router`] backed by a [`FriendService`] over any
//! [`ContactStore`]. Authentication, TLS, and transport concerns are the
//! caller's responsibility; the caller's identity arrives in the
//! [`OWNER_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", friendsync_api::api_router(service.clone()))
//! ```

pub mod error;
pub mod friends;
pub mod meetings;
pub mod owner;
pub mod reminders;


use axum::{
  Router,
  routing::{get, patch, post},
};
use friendsync_core::{service::FriendService, store::ContactStore};

pub use error::ApiError;
pub use owner::{OWNER_HEADER, Owner};

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: FriendService<S>) -> Router<()>
where
  S: ContactStore + 'static,
{
  Router::new()
    // Reminders
    .route("/reminders/summary", get(reminders::summary::<S>))
    .route("/reminders/overdue", get(reminders::overdue::<S>))
    .route("/reminders/stats", get(reminders::stats::<S>))
    .route("/reminders/mark-contacted", post(reminders::mark_contacted::<S>))
    // Friends
    .route("/friends", get(friends::list::<S>).post(friends::create::<S>))
    .route(
      "/friends/{id}",
      get(friends::get_one::<S>)
        .patch(friends::update::<S>)
        .delete(friends::delete::<S>),
    )
    .route("/friends/{id}/meetings", get(friends::meetings::<S>))
    // Meetings
    .route("/meetings", post(meetings::create::<S>))
    .route("/meetings/{id}", patch(meetings::update::<S>).delete(meetings::delete::<S>))
    .with_state(service)
}
