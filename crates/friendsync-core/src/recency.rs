//! Recency calculation: how long since a friend was last contacted, and
//! whether that exceeds their reminder interval.
//!
//! Everything here is pure: no I/O, no clock reads. The caller supplies `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::friend::Friend;

/// The elapsed-time view of one friend at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recency {
  /// Whole days since the last contact, truncated.
  pub days_since_contact: i64,
  pub reminder_days:      u32,
}

impl Recency {
  /// Compute recency for `friend` as of `now`.
  ///
  /// Returns `None` for a friend that has never been contacted; such friends
  /// have no timestamp to measure from and must not reach this stage.
  pub fn of(friend: &Friend, now: DateTime<Utc>) -> Option<Self> {
    let last = friend.last_contact_at?;
    Some(Self {
      days_since_contact: (now - last).num_days(),
      reminder_days:      friend.reminder_days,
    })
  }

  pub fn is_overdue(&self) -> bool {
    self.days_since_contact >= i64::from(self.reminder_days)
  }

  /// Days past the reminder interval. Negative when not yet overdue.
  pub fn days_overdue(&self) -> i64 {
    self.days_since_contact - i64::from(self.reminder_days)
  }
}

/// A derived, never-persisted description of one overdue friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueEntry {
  pub friend_id:          Uuid,
  pub friend_name:        String,
  pub last_contact_at:    DateTime<Utc>,
  pub days_since_contact: i64,
  /// Always `>= 0`.
  pub days_overdue:       i64,
  pub message:            String,
}

impl OverdueEntry {
  /// Build an entry if `friend` is overdue as of `now`.
  pub fn evaluate(friend: &Friend, now: DateTime<Utc>) -> Option<Self> {
    let recency = Recency::of(friend, now)?;
    if !recency.is_overdue() {
      return None;
    }
    Some(Self {
      friend_id:          friend.friend_id,
      friend_name:        friend.name.clone(),
      last_contact_at:    friend.last_contact_at?,
      days_since_contact: recency.days_since_contact,
      days_overdue:       recency.days_overdue(),
      message:            reminder_message(&friend.name, recency.days_since_contact),
    })
  }
}

pub fn reminder_message(name: &str, days_since_contact: i64) -> String {
  format!("Reach out to {name}! ({days_since_contact} days)")
}

/// Run the precise overdue predicate over coarse-filter candidates, keeping
/// their order.
pub fn overdue_entries<'a>(
  candidates: impl IntoIterator<Item = &'a Friend>,
  now: DateTime<Utc>,
) -> Vec<OverdueEntry> {
  candidates
    .into_iter()
    .filter_map(|f| OverdueEntry::evaluate(f, now))
    .collect()
}
