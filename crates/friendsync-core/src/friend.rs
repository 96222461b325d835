//! Friend records, one per tracked relationship.
//!
//! A friend carries the two fields the reminder pipeline cares about
//! (`last_contact_at`, `reminder_days`) plus plain contact details. Every
//! record belongs to exactly one owner, and every read or write is scoped by
//! that owner.

use std::fmt;

use chrono::{DateTime, Datelike as _, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, meeting::Meeting};

/// Smallest reminder interval an owner may configure.
pub const MIN_REMINDER_DAYS: u32 = 1;
/// Largest reminder interval an owner may configure.
pub const MAX_REMINDER_DAYS: u32 = 365;
/// Interval assigned when a friend is added without one.
pub const DEFAULT_REMINDER_DAYS: u32 = 30;

// ─── Owner ───────────────────────────────────────────────────────────────────

/// Identifies the account that controls a set of friends.
///
/// Issued by an external identity provider; opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Friend ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
  pub friend_id:       Uuid,
  pub owner_id:        OwnerId,
  pub name:            String,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  /// `None` means the friend has never been contacted.
  pub last_contact_at: Option<DateTime<Utc>>,
  /// Always within `MIN_REMINDER_DAYS..=MAX_REMINDER_DAYS`.
  pub reminder_days:   u32,
  /// Number of meetings logged with this friend; computed on read.
  pub meeting_count:   u64,
  /// Incremented by every write to the record.
  pub version:         i64,
  pub created_at:      DateTime<Utc>,
}

/// A friend together with its most recent meetings, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendDetail {
  #[serde(flatten)]
  pub friend:          Friend,
  pub recent_meetings: Vec<Meeting>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContactStore::add_friend`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFriend {
  pub name:            String,
  #[serde(default)]
  pub email:           Option<String>,
  #[serde(default)]
  pub phone:           Option<String>,
  #[serde(default = "default_reminder_days")]
  pub reminder_days:   u32,
  #[serde(default)]
  pub last_contact_at: Option<DateTime<Utc>>,
}

fn default_reminder_days() -> u32 { DEFAULT_REMINDER_DAYS }

impl NewFriend {
  /// Convenience constructor with all optional fields set to their defaults.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:            name.into(),
      email:           None,
      phone:           None,
      reminder_days:   DEFAULT_REMINDER_DAYS,
      last_contact_at: None,
    }
  }

  pub fn validate(&self) -> Result<()> {
    validate_name(&self.name)?;
    validate_reminder_days(self.reminder_days)?;
    match self.last_contact_at {
      Some(at) => validate_timestamp("last_contact_at", at),
      None => Ok(()),
    }
  }
}

/// Partial update accepted by [`crate::store::ContactStore::update_friend`].
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FriendPatch {
  pub name:          Option<String>,
  pub email:         Option<String>,
  pub phone:         Option<String>,
  pub reminder_days: Option<u32>,
}

impl FriendPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      validate_name(name)?;
    }
    if let Some(days) = self.reminder_days {
      validate_reminder_days(days)?;
    }
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.email.is_none()
      && self.phone.is_none()
      && self.reminder_days.is_none()
  }
}

fn validate_name(name: &str) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::validation("name is required"));
  }
  Ok(())
}

pub fn validate_reminder_days(days: u32) -> Result<()> {
  if !(MIN_REMINDER_DAYS..=MAX_REMINDER_DAYS).contains(&days) {
    return Err(Error::validation(format!(
      "reminder_days must be between {MIN_REMINDER_DAYS} and \
       {MAX_REMINDER_DAYS}, got {days}"
    )));
  }
  Ok(())
}

/// Stored timestamps are four-digit-year RFC 3339 text; anything outside
/// that range would neither sort nor parse back.
pub fn validate_timestamp(field: &str, at: DateTime<Utc>) -> Result<()> {
  if !(0..=9999).contains(&at.year()) {
    return Err(Error::validation(format!(
      "{field} must fall within years 0000-9999, got {at}"
    )));
  }
  Ok(())
}
