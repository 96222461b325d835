//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so lexical and chronological order agree. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use friendsync_core::{
  friend::{Friend, OwnerId},
  meeting::Meeting,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn decode_u32(column: &str, v: i64) -> Result<u32> {
  u32::try_from(v)
    .map_err(|_| Error::InvalidValue(format!("{column} out of range: {v}")))
}

pub fn decode_count(v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::InvalidValue(format!("negative count: {v}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawFriend::from_row`]. Expects `friends` aliased
/// as `f`.
pub const FRIEND_COLUMNS: &str = "
  f.friend_id, f.owner_id, f.name, f.email, f.phone, f.last_contact_at,
  f.reminder_days, f.version, f.created_at,
  (SELECT COUNT(*) FROM meetings m WHERE m.friend_id = f.friend_id)";

/// Raw values read directly from a `friends` row plus its meeting count.
pub struct RawFriend {
  pub friend_id:       String,
  pub owner_id:        String,
  pub name:            String,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  pub last_contact_at: Option<String>,
  pub reminder_days:   i64,
  pub version:         i64,
  pub created_at:      String,
  pub meeting_count:   i64,
}

impl RawFriend {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      friend_id:       row.get(0)?,
      owner_id:        row.get(1)?,
      name:            row.get(2)?,
      email:           row.get(3)?,
      phone:           row.get(4)?,
      last_contact_at: row.get(5)?,
      reminder_days:   row.get(6)?,
      version:         row.get(7)?,
      created_at:      row.get(8)?,
      meeting_count:   row.get(9)?,
    })
  }

  pub fn into_friend(self) -> Result<Friend> {
    Ok(Friend {
      friend_id:       decode_uuid(&self.friend_id)?,
      owner_id:        OwnerId::new(self.owner_id),
      name:            self.name,
      email:           self.email,
      phone:           self.phone,
      last_contact_at: self.last_contact_at.as_deref().map(decode_dt).transpose()?,
      reminder_days:   decode_u32("reminder_days", self.reminder_days)?,
      meeting_count:   decode_count(self.meeting_count)?,
      version:         self.version,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawMeeting::from_row`].
pub const MEETING_COLUMNS: &str = "
  meeting_id, owner_id, friend_id, title, date,
  duration_minutes, location, notes";

/// Raw values read directly from a `meetings` row.
pub struct RawMeeting {
  pub meeting_id:       String,
  pub owner_id:         String,
  pub friend_id:        String,
  pub title:            String,
  pub date:             String,
  pub duration_minutes: Option<i64>,
  pub location:         Option<String>,
  pub notes:            Option<String>,
}

impl RawMeeting {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      meeting_id:       row.get(0)?,
      owner_id:         row.get(1)?,
      friend_id:        row.get(2)?,
      title:            row.get(3)?,
      date:             row.get(4)?,
      duration_minutes: row.get(5)?,
      location:         row.get(6)?,
      notes:            row.get(7)?,
    })
  }

  pub fn into_meeting(self) -> Result<Meeting> {
    Ok(Meeting {
      meeting_id:       decode_uuid(&self.meeting_id)?,
      owner_id:         OwnerId::new(self.owner_id),
      friend_id:        decode_uuid(&self.friend_id)?,
      title:            self.title,
      date:             decode_dt(&self.date)?,
      duration_minutes: self
        .duration_minutes
        .map(|m| decode_u32("duration_minutes", m))
        .transpose()?,
      location:         self.location,
      notes:            self.notes,
    })
  }
}
