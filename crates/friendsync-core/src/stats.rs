//! Dashboard statistics over an owner's whole friend set.
//!
//! `overdue_count` here is the coarse "not contacted within the window"
//! count, not the per-friend overdue predicate used by the reminder list. The
//! two can disagree; the dashboard has always shown the coarse figure.

use serde::{Deserialize, Serialize};

use crate::store::FriendAggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
  pub total_friends:      u64,
  pub avg_reminder_days:  u64,
  pub overdue_count:      u64,
  pub active_this_month:  u64,
  pub overdue_percentage: u64,
}

impl StatsSnapshot {
  /// Assemble a snapshot. Zero-friend owners yield zeros, never NaN.
  pub fn from_parts(aggregate: FriendAggregate, recent_meetings: u64) -> Self {
    let avg_reminder_days = aggregate
      .avg_reminder_days
      .filter(|avg| avg.is_finite())
      .map_or(0, |avg| avg.round().max(0.0) as u64);

    Self {
      total_friends: aggregate.total,
      avg_reminder_days,
      overdue_count: aggregate.stale,
      active_this_month: recent_meetings,
      overdue_percentage: percentage(aggregate.stale, aggregate.total),
    }
  }
}

/// `round(part / whole * 100)`, or `0` when `whole == 0`.
pub fn percentage(part: u64, whole: u64) -> u64 {
  if whole == 0 {
    return 0;
  }
  (part as f64 / whole as f64 * 100.0).round() as u64
}
