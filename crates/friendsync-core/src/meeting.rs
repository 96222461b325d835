//! Meetings: logged encounters with a friend.
//!
//! Logging a meeting is the ordinary way a friend's `last_contact_at` moves
//! forward; the bulk reset in [`crate::service`] is the other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  friend::{OwnerId, validate_timestamp},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
  pub meeting_id:       Uuid,
  pub owner_id:         OwnerId,
  pub friend_id:        Uuid,
  pub title:            String,
  pub date:             DateTime<Utc>,
  pub duration_minutes: Option<u32>,
  pub location:         Option<String>,
  pub notes:            Option<String>,
}

/// Input to [`crate::store::ContactStore::log_meeting`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeeting {
  pub friend_id:        Uuid,
  pub title:            String,
  pub date:             DateTime<Utc>,
  #[serde(default)]
  pub duration_minutes: Option<u32>,
  #[serde(default)]
  pub location:         Option<String>,
  #[serde(default)]
  pub notes:            Option<String>,
}

impl NewMeeting {
  pub fn new(friend_id: Uuid, title: impl Into<String>, date: DateTime<Utc>) -> Self {
    Self {
      friend_id,
      title: title.into(),
      date,
      duration_minutes: None,
      location: None,
      notes: None,
    }
  }

  pub fn validate(&self) -> Result<()> {
    validate_title(&self.title)?;
    validate_timestamp("date", self.date)
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingPatch {
  pub title:            Option<String>,
  pub date:             Option<DateTime<Utc>>,
  pub duration_minutes: Option<u32>,
  pub location:         Option<String>,
  pub notes:            Option<String>,
}

impl MeetingPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(title) = &self.title {
      validate_title(title)?;
    }
    if let Some(date) = self.date {
      validate_timestamp("date", date)?;
    }
    Ok(())
  }
}

fn validate_title(title: &str) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::validation("meeting title is required"));
  }
  Ok(())
}
