//! The `ContactStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `friendsync-store-sqlite`). Higher layers (the reminder service, the HTTP
//! API) depend on this abstraction, not on any concrete backend.
//!
//! Every method takes the caller's [`OwnerId`] and must never read or write a
//! record belonging to a different owner. A record owned by someone else is
//! indistinguishable from a missing one.

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  error::StoreError,
  friend::{Friend, FriendPatch, NewFriend, OwnerId},
  meeting::{Meeting, MeetingPatch, NewMeeting},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`ContactStore::overdue_candidates`], the coarse filter.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
  pub owner:            OwnerId,
  /// Only friends with `last_contact_at <= contacted_before` are returned.
  /// Friends that were never contacted never match.
  pub contacted_before: DateTime<Utc>,
  /// Upper bound on the number of rows returned.
  pub limit:            usize,
}

/// Aggregates over an owner's full friend set, for the stats snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FriendAggregate {
  pub total:             u64,
  /// Mean `reminder_days`; `None` if the owner has no friends.
  pub avg_reminder_days: Option<f64>,
  /// Friends with `last_contact_at <= stale_before`.
  pub stale:             u64,
}

/// A single all-or-nothing bulk "mark as contacted" write.
#[derive(Debug, Clone)]
pub struct ContactReset {
  pub owner:             OwnerId,
  pub friend_ids:        Vec<Uuid>,
  /// Optional optimistic-concurrency tokens. If any matched friend's version
  /// differs from its entry here, nothing is written.
  pub expected_versions: HashMap<Uuid, i64>,
  pub contacted_at:      DateTime<Utc>,
  /// `reminder_days` is decremented by one but never below this value.
  pub interval_floor:    u32,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a FriendSync storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: StoreError;

  // ── Friends ───────────────────────────────────────────────────────────

  /// Create and persist a new friend for `owner`.
  fn add_friend<'a>(
    &'a self,
    owner: &'a OwnerId,
    input: NewFriend,
  ) -> impl Future<Output = Result<Friend, Self::Error>> + Send + 'a;

  /// Retrieve a friend by id. Returns `None` if missing or not owned.
  fn get_friend<'a>(
    &'a self,
    owner: &'a OwnerId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Friend>, Self::Error>> + Send + 'a;

  /// List all of `owner`'s friends, most recently contacted first and
  /// never-contacted friends last.
  fn list_friends<'a>(
    &'a self,
    owner: &'a OwnerId,
  ) -> impl Future<Output = Result<Vec<Friend>, Self::Error>> + Send + 'a;

  /// Apply a partial update. Returns `None` if missing or not owned.
  fn update_friend<'a>(
    &'a self,
    owner: &'a OwnerId,
    id: Uuid,
    patch: FriendPatch,
  ) -> impl Future<Output = Result<Option<Friend>, Self::Error>> + Send + 'a;

  /// Delete a friend and its meetings. Returns whether anything was deleted.
  fn delete_friend<'a>(
    &'a self,
    owner: &'a OwnerId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Meetings ──────────────────────────────────────────────────────────

  /// Record a meeting and move the friend's `last_contact_at` to its date,
  /// in one transaction. Fails with a not-found error if the friend is
  /// missing or not owned.
  fn log_meeting<'a>(
    &'a self,
    owner: &'a OwnerId,
    input: NewMeeting,
  ) -> impl Future<Output = Result<Meeting, Self::Error>> + Send + 'a;

  /// Meetings with one friend, newest first, at most `limit` if given.
  fn list_meetings<'a>(
    &'a self,
    owner: &'a OwnerId,
    friend_id: Uuid,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<Meeting>, Self::Error>> + Send + 'a;

  fn update_meeting<'a>(
    &'a self,
    owner: &'a OwnerId,
    id: Uuid,
    patch: MeetingPatch,
  ) -> impl Future<Output = Result<Option<Meeting>, Self::Error>> + Send + 'a;

  fn delete_meeting<'a>(
    &'a self,
    owner: &'a OwnerId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Count `owner`'s meetings dated on or after `since`.
  fn count_meetings_since<'a>(
    &'a self,
    owner: &'a OwnerId,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Reminder pipeline ─────────────────────────────────────────────────

  /// The coarse filter: friends contacted on or before
  /// `query.contacted_before`, oldest contact first, at most `query.limit`.
  fn overdue_candidates<'a>(
    &'a self,
    query: &'a CandidateQuery,
  ) -> impl Future<Output = Result<Vec<Friend>, Self::Error>> + Send + 'a;

  /// Smallest `reminder_days` among `owner`'s friends that have a
  /// `last_contact_at`. `None` if there are none.
  fn min_reminder_days<'a>(
    &'a self,
    owner: &'a OwnerId,
  ) -> impl Future<Output = Result<Option<u32>, Self::Error>> + Send + 'a;

  fn count_friends<'a>(
    &'a self,
    owner: &'a OwnerId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  fn friend_aggregate<'a>(
    &'a self,
    owner: &'a OwnerId,
    stale_before: DateTime<Utc>,
  ) -> impl Future<Output = Result<FriendAggregate, Self::Error>> + Send + 'a;

  /// Apply a [`ContactReset`] atomically and return the updated friends.
  ///
  /// Ids that are missing or owned by someone else are skipped; they are
  /// not an error. Either every matched friend is updated or none is.
  fn reset_contacts<'a>(
    &'a self,
    reset: &'a ContactReset,
  ) -> impl Future<Output = Result<Vec<Friend>, Self::Error>> + Send + 'a;
}
