//! [`SqliteStore`]: the SQLite implementation of [`ContactStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use friendsync_core::{
  friend::{Friend, FriendPatch, NewFriend, OwnerId},
  meeting::{Meeting, MeetingPatch, NewMeeting},
  store::{CandidateQuery, ContactReset, ContactStore, FriendAggregate},
};

use crate::{
  Error, Result,
  encode::{
    FRIEND_COLUMNS, MEETING_COLUMNS, RawFriend, RawMeeting, decode_count,
    decode_u32, decode_uuid, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of the bulk-reset transaction closure.
enum ResetOutcome {
  Updated(Vec<RawFriend>),
  /// Rolled back: a stored version did not match the caller's.
  Conflict {
    friend_id: String,
    expected:  i64,
    actual:    i64,
  },
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A FriendSync contact store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema ready");
    Ok(())
  }

  async fn fetch_friend(&self, owner: &OwnerId, id: Uuid) -> Result<Option<Friend>> {
    let owner_str = owner.as_str().to_owned();
    let id_str = encode_uuid(id);

    let raw: Option<RawFriend> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {FRIEND_COLUMNS} FROM friends f
               WHERE f.friend_id = ?1 AND f.owner_id = ?2"
            ),
            rusqlite::params![id_str, owner_str],
            RawFriend::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawFriend::into_friend).transpose()
  }

  async fn fetch_meeting(&self, owner: &OwnerId, id: Uuid) -> Result<Option<Meeting>> {
    let owner_str = owner.as_str().to_owned();
    let id_str = encode_uuid(id);

    let raw: Option<RawMeeting> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {MEETING_COLUMNS} FROM meetings
               WHERE meeting_id = ?1 AND owner_id = ?2"
            ),
            rusqlite::params![id_str, owner_str],
            RawMeeting::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMeeting::into_meeting).transpose()
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  // ── Friends ───────────────────────────────────────────────────────────────

  async fn add_friend(&self, owner: &OwnerId, input: NewFriend) -> Result<Friend> {
    let friend = Friend {
      friend_id:       Uuid::new_v4(),
      owner_id:        owner.clone(),
      name:            input.name,
      email:           input.email,
      phone:           input.phone,
      // Stored at microsecond precision; match it so callers see what a
      // later read returns.
      last_contact_at: input.last_contact_at.map(|t| t.trunc_subsecs(6)),
      reminder_days:   input.reminder_days,
      meeting_count:   0,
      version:         0,
      created_at:      Utc::now().trunc_subsecs(6),
    };

    let id_str       = encode_uuid(friend.friend_id);
    let owner_str    = owner.as_str().to_owned();
    let name         = friend.name.clone();
    let email        = friend.email.clone();
    let phone        = friend.phone.clone();
    let last_str     = friend.last_contact_at.map(encode_dt);
    let reminder     = i64::from(friend.reminder_days);
    let created_str  = encode_dt(friend.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO friends (
             friend_id, owner_id, name, email, phone,
             last_contact_at, reminder_days, version, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
          rusqlite::params![
            id_str, owner_str, name, email, phone, last_str, reminder, created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(friend)
  }

  async fn get_friend(&self, owner: &OwnerId, id: Uuid) -> Result<Option<Friend>> {
    self.fetch_friend(owner, id).await
  }

  async fn list_friends(&self, owner: &OwnerId) -> Result<Vec<Friend>> {
    let owner_str = owner.as_str().to_owned();

    let raws: Vec<RawFriend> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FRIEND_COLUMNS} FROM friends f
           WHERE f.owner_id = ?1
           ORDER BY f.last_contact_at IS NULL, f.last_contact_at DESC, f.name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawFriend::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFriend::into_friend).collect()
  }

  async fn update_friend(
    &self,
    owner: &OwnerId,
    id:    Uuid,
    patch: FriendPatch,
  ) -> Result<Option<Friend>> {
    let owner_str = owner.as_str().to_owned();
    let id_str    = encode_uuid(id);
    let reminder  = patch.reminder_days.map(i64::from);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE friends SET
             name          = COALESCE(?1, name),
             email         = COALESCE(?2, email),
             phone         = COALESCE(?3, phone),
             reminder_days = COALESCE(?4, reminder_days),
             version       = version + 1
           WHERE friend_id = ?5 AND owner_id = ?6",
          rusqlite::params![patch.name, patch.email, patch.phone, reminder, id_str, owner_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_friend(owner, id).await
  }

  async fn delete_friend(&self, owner: &OwnerId, id: Uuid) -> Result<bool> {
    let owner_str = owner.as_str().to_owned();
    let id_str    = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM friends WHERE friend_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Meetings ──────────────────────────────────────────────────────────────

  async fn log_meeting(&self, owner: &OwnerId, input: NewMeeting) -> Result<Meeting> {
    let meeting = Meeting {
      meeting_id:       Uuid::new_v4(),
      owner_id:         owner.clone(),
      friend_id:        input.friend_id,
      title:            input.title,
      date:             input.date.trunc_subsecs(6),
      duration_minutes: input.duration_minutes,
      location:         input.location,
      notes:            input.notes,
    };

    let meeting_id_str = encode_uuid(meeting.meeting_id);
    let friend_id_str  = encode_uuid(meeting.friend_id);
    let owner_str      = owner.as_str().to_owned();
    let title          = meeting.title.clone();
    let date_str       = encode_dt(meeting.date);
    let duration       = meeting.duration_minutes.map(i64::from);
    let location       = meeting.location.clone();
    let notes          = meeting.notes.clone();

    let friend_found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Only ever moves last contact forward.
        let touched = tx.execute(
          "UPDATE friends SET
             last_contact_at = CASE
               WHEN last_contact_at IS NULL OR last_contact_at < ?1 THEN ?1
               ELSE last_contact_at
             END,
             version = version + 1
           WHERE friend_id = ?2 AND owner_id = ?3",
          rusqlite::params![date_str, friend_id_str, owner_str],
        )?;
        if touched == 0 {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO meetings (
             meeting_id, owner_id, friend_id, title, date,
             duration_minutes, location, notes
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            meeting_id_str, owner_str, friend_id_str, title, date_str,
            duration, location, notes,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !friend_found {
      return Err(friendsync_core::Error::FriendNotFound(meeting.friend_id).into());
    }
    Ok(meeting)
  }

  async fn list_meetings(
    &self,
    owner:     &OwnerId,
    friend_id: Uuid,
    limit:     Option<usize>,
  ) -> Result<Vec<Meeting>> {
    let owner_str  = owner.as_str().to_owned();
    let friend_str = encode_uuid(friend_id);
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val  = limit.map_or(-1, |l| l as i64);

    let raws: Vec<RawMeeting> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEETING_COLUMNS} FROM meetings
           WHERE friend_id = ?1 AND owner_id = ?2
           ORDER BY date DESC
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![friend_str, owner_str, limit_val],
            RawMeeting::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMeeting::into_meeting).collect()
  }

  async fn update_meeting(
    &self,
    owner: &OwnerId,
    id:    Uuid,
    patch: MeetingPatch,
  ) -> Result<Option<Meeting>> {
    let owner_str = owner.as_str().to_owned();
    let id_str    = encode_uuid(id);
    let date_str  = patch.date.map(encode_dt);
    let duration  = patch.duration_minutes.map(i64::from);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE meetings SET
             title            = COALESCE(?1, title),
             date             = COALESCE(?2, date),
             duration_minutes = COALESCE(?3, duration_minutes),
             location         = COALESCE(?4, location),
             notes            = COALESCE(?5, notes)
           WHERE meeting_id = ?6 AND owner_id = ?7",
          rusqlite::params![
            patch.title, date_str, duration, patch.location, patch.notes,
            id_str, owner_str,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_meeting(owner, id).await
  }

  async fn delete_meeting(&self, owner: &OwnerId, id: Uuid) -> Result<bool> {
    let owner_str = owner.as_str().to_owned();
    let id_str    = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM meetings WHERE meeting_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn count_meetings_since(
    &self,
    owner: &OwnerId,
    since: DateTime<Utc>,
  ) -> Result<u64> {
    let owner_str = owner.as_str().to_owned();
    let since_str = encode_dt(since);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM meetings WHERE owner_id = ?1 AND date >= ?2",
          rusqlite::params![owner_str, since_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    decode_count(count)
  }

  // ── Reminder pipeline ─────────────────────────────────────────────────────

  async fn overdue_candidates(&self, query: &CandidateQuery) -> Result<Vec<Friend>> {
    let owner_str  = query.owner.as_str().to_owned();
    let before_str = encode_dt(query.contacted_before);
    let limit_val  = i64::try_from(query.limit).unwrap_or(i64::MAX);

    let raws: Vec<RawFriend> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FRIEND_COLUMNS} FROM friends f
           WHERE f.owner_id = ?1
             AND f.last_contact_at IS NOT NULL
             AND f.last_contact_at <= ?2
           ORDER BY f.last_contact_at ASC, f.friend_id ASC
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![owner_str, before_str, limit_val],
            RawFriend::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFriend::into_friend).collect()
  }

  async fn min_reminder_days(&self, owner: &OwnerId) -> Result<Option<u32>> {
    let owner_str = owner.as_str().to_owned();

    let min: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT MIN(reminder_days) FROM friends
           WHERE owner_id = ?1 AND last_contact_at IS NOT NULL",
          rusqlite::params![owner_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    min.map(|m| decode_u32("reminder_days", m)).transpose()
  }

  async fn count_friends(&self, owner: &OwnerId) -> Result<u64> {
    let owner_str = owner.as_str().to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM friends WHERE owner_id = ?1",
          rusqlite::params![owner_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    decode_count(count)
  }

  async fn friend_aggregate(
    &self,
    owner:        &OwnerId,
    stale_before: DateTime<Utc>,
  ) -> Result<FriendAggregate> {
    let owner_str  = owner.as_str().to_owned();
    let before_str = encode_dt(stale_before);

    let (total, avg, stale): (i64, Option<f64>, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             COUNT(*),
             AVG(reminder_days),
             COALESCE(SUM(last_contact_at IS NOT NULL AND last_contact_at <= ?2), 0)
           FROM friends
           WHERE owner_id = ?1",
          rusqlite::params![owner_str, before_str],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?)
      })
      .await?;

    Ok(FriendAggregate {
      total:             decode_count(total)?,
      avg_reminder_days: avg,
      stale:             decode_count(stale)?,
    })
  }

  async fn reset_contacts(&self, reset: &ContactReset) -> Result<Vec<Friend>> {
    let owner_str = reset.owner.as_str().to_owned();
    let at_str    = encode_dt(reset.contacted_at);
    let floor     = i64::from(reset.interval_floor);
    let ids: Vec<String> = reset.friend_ids.iter().copied().map(encode_uuid).collect();
    let expected: Vec<(String, i64)> = reset
      .expected_versions
      .iter()
      .map(|(id, v)| (encode_uuid(*id), *v))
      .collect();

    let outcome = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without commit rolls everything back.
        let tx = conn.transaction()?;

        for (id, expected) in &expected {
          let actual: Option<i64> = tx
            .query_row(
              "SELECT version FROM friends WHERE friend_id = ?1 AND owner_id = ?2",
              rusqlite::params![id, owner_str],
              |r| r.get(0),
            )
            .optional()?;
          if let Some(actual) = actual
            && actual != *expected
          {
            return Ok(ResetOutcome::Conflict {
              friend_id: id.clone(),
              expected:  *expected,
              actual,
            });
          }
        }

        let mut updated_ids = Vec::with_capacity(ids.len());
        {
          let mut update = tx.prepare(
            "UPDATE friends SET
               last_contact_at = ?1,
               reminder_days   = CASE
                 WHEN reminder_days > ?2 THEN reminder_days - 1
                 ELSE reminder_days
               END,
               version         = version + 1
             WHERE friend_id = ?3 AND owner_id = ?4",
          )?;
          for id in &ids {
            if update.execute(rusqlite::params![at_str, floor, id, owner_str])? > 0 {
              updated_ids.push(id.clone());
            }
          }
        }

        let mut rows = Vec::with_capacity(updated_ids.len());
        {
          let mut select = tx.prepare(&format!(
            "SELECT {FRIEND_COLUMNS} FROM friends f WHERE f.friend_id = ?1"
          ))?;
          for id in &updated_ids {
            rows.push(select.query_row(rusqlite::params![id], RawFriend::from_row)?);
          }
        }

        tx.commit()?;
        Ok(ResetOutcome::Updated(rows))
      })
      .await?;

    match outcome {
      ResetOutcome::Updated(raws) => {
        raws.into_iter().map(RawFriend::into_friend).collect()
      }
      ResetOutcome::Conflict { friend_id, expected, actual } => {
        tracing::debug!(%friend_id, expected, actual, "version mismatch, bulk reset rolled back");
        Err(Error::Core(friendsync_core::Error::VersionConflict {
          friend_id: decode_uuid(&friend_id)?,
          expected,
          actual,
        }))
      }
    }
  }
}
