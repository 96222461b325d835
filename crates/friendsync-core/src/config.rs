//! Tunables for the reminder pipeline.
//!
//! Deserialised as the `[reminders]` table of the server configuration;
//! every field has a default.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  friend::{MAX_REMINDER_DAYS, MIN_REMINDER_DAYS},
  retry::RetryPolicy,
};

/// How far back the coarse filter looks.
///
/// The window must never exceed the smallest reminder interval among the
/// records it screens, or genuinely overdue friends are dropped before the
/// precise check sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Lookback {
  /// Use the owner's smallest `reminder_days`. Never drops an overdue friend.
  #[default]
  MinInterval,
  /// A fixed number of days. Drops overdue friends whose interval is shorter
  /// than `days`.
  Fixed { days: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
  pub lookback:                Lookback,
  /// Candidate cap for the overdue summary.
  pub summary_candidate_limit: usize,
  /// Extra candidates fetched beyond `skip + take` on the first page fetch.
  pub page_buffer:             usize,
  /// How many times a short page may double its fetch cap and try again.
  pub max_widening_rounds:     u32,
  pub stats_window_days:       u32,
  /// Lowest value the bulk reset may decrement `reminder_days` to.
  pub interval_floor:          u32,
  pub retry:                   RetryPolicy,
}

impl Default for ReminderConfig {
  fn default() -> Self {
    Self {
      lookback:                Lookback::MinInterval,
      summary_candidate_limit: 200,
      page_buffer:             10,
      max_widening_rounds:     4,
      stats_window_days:       30,
      interval_floor:          MIN_REMINDER_DAYS,
      retry:                   RetryPolicy::default(),
    }
  }
}

impl ReminderConfig {
  pub fn validate(&self) -> Result<()> {
    if self.interval_floor < MIN_REMINDER_DAYS {
      return Err(Error::validation(format!(
        "interval_floor must be at least {MIN_REMINDER_DAYS}"
      )));
    }
    if self.summary_candidate_limit == 0 {
      return Err(Error::validation("summary_candidate_limit must be positive"));
    }
    if let Lookback::Fixed { days } = self.lookback
      && !(MIN_REMINDER_DAYS..=MAX_REMINDER_DAYS).contains(&days)
    {
      return Err(Error::validation(format!(
        "fixed lookback must be between {MIN_REMINDER_DAYS} and {MAX_REMINDER_DAYS} days, got {days}"
      )));
    }
    if !(MIN_REMINDER_DAYS..=MAX_REMINDER_DAYS).contains(&self.stats_window_days) {
      return Err(Error::validation(format!(
        "stats_window_days must be between {MIN_REMINDER_DAYS} and {MAX_REMINDER_DAYS}, got {}",
        self.stats_window_days
      )));
    }
    Ok(())
  }
}
