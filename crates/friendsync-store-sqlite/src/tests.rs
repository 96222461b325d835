//! Integration tests for `SqliteStore` and the reminder pipeline against an
//! in-memory database.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use friendsync_core::{
  Error as CoreError, ErrorKind, ServiceError, StoreError,
  config::{Lookback, ReminderConfig},
  friend::{Friend, FriendPatch, NewFriend, OwnerId},
  meeting::{MeetingPatch, NewMeeting},
  paginate::PageRequest,
  service::{FriendService, MarkContacted},
  stats::StatsSnapshot,
  store::{CandidateQuery, ContactReset, ContactStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() }

fn days_ago(days: i64) -> DateTime<Utc> { now() - Duration::days(days) }

fn owner() -> OwnerId { OwnerId::new("zoey") }

fn other_owner() -> OwnerId { OwnerId::new("mallory") }

async fn friend(
  s: &SqliteStore,
  owner: &OwnerId,
  name: &str,
  reminder_days: u32,
  last_contact: Option<DateTime<Utc>>,
) -> Friend {
  let mut input = NewFriend::new(name);
  input.reminder_days = reminder_days;
  input.last_contact_at = last_contact;
  s.add_friend(owner, input).await.unwrap()
}

fn service(s: &SqliteStore, config: ReminderConfig) -> FriendService<SqliteStore> {
  FriendService::new(Arc::new(s.clone()), config)
}

fn reset(ids: Vec<Uuid>) -> ContactReset {
  ContactReset {
    owner:             owner(),
    friend_ids:        ids,
    expected_versions: Default::default(),
    contacted_at:      now(),
    interval_floor:    1,
  }
}

// ─── Friends ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_friend() {
  let s = store().await;
  let mut input = NewFriend::new("Alice Johnson");
  input.email = Some("alice@work.com".into());
  input.last_contact_at = Some(days_ago(3));
  let added = s.add_friend(&owner(), input).await.unwrap();

  let fetched = s.get_friend(&owner(), added.friend_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Alice Johnson");
  assert_eq!(fetched.email.as_deref(), Some("alice@work.com"));
  assert_eq!(fetched.reminder_days, 30);
  assert_eq!(fetched.last_contact_at, Some(days_ago(3)));
  assert_eq!(fetched.meeting_count, 0);
  assert_eq!(fetched.version, 0);
}

#[tokio::test]
async fn friends_are_invisible_to_other_owners() {
  let s = store().await;
  let alice = friend(&s, &owner(), "Alice", 30, None).await;

  assert!(s.get_friend(&other_owner(), alice.friend_id).await.unwrap().is_none());
  assert!(s.list_friends(&other_owner()).await.unwrap().is_empty());
  assert!(
    s.update_friend(&other_owner(), alice.friend_id, FriendPatch {
      name: Some("Hijacked".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .is_none()
  );
  assert!(!s.delete_friend(&other_owner(), alice.friend_id).await.unwrap());
  assert_eq!(s.get_friend(&owner(), alice.friend_id).await.unwrap().unwrap().name, "Alice");
}

#[tokio::test]
async fn list_friends_most_recent_first_never_contacted_last() {
  let s = store().await;
  friend(&s, &owner(), "Never", 30, None).await;
  friend(&s, &owner(), "Old", 30, Some(days_ago(90))).await;
  friend(&s, &owner(), "Recent", 30, Some(days_ago(1))).await;

  let names: Vec<_> = s
    .list_friends(&owner())
    .await
    .unwrap()
    .into_iter()
    .map(|f| f.name)
    .collect();
  assert_eq!(names, ["Recent", "Old", "Never"]);
}

#[tokio::test]
async fn update_friend_patches_fields_and_bumps_version() {
  let s = store().await;
  let bob = friend(&s, &owner(), "Bob", 7, None).await;

  let updated = s
    .update_friend(&owner(), bob.friend_id, FriendPatch {
      phone: Some("+1-555-0102".into()),
      reminder_days: Some(14),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.name, "Bob");
  assert_eq!(updated.phone.as_deref(), Some("+1-555-0102"));
  assert_eq!(updated.reminder_days, 14);
  assert_eq!(updated.version, 1);
}

#[tokio::test]
async fn out_of_range_interval_is_rejected_by_schema() {
  let s = store().await;
  let mut input = NewFriend::new("Broken");
  input.reminder_days = 0;
  let err = s.add_friend(&owner(), input).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Invalid);
}

// ─── Meetings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn log_meeting_updates_last_contact_and_count() {
  let s = store().await;
  let alice = friend(&s, &owner(), "Alice", 30, Some(days_ago(40))).await;

  s.log_meeting(&owner(), NewMeeting::new(alice.friend_id, "Coffee", days_ago(2)))
    .await
    .unwrap();

  let fetched = s.get_friend(&owner(), alice.friend_id).await.unwrap().unwrap();
  assert_eq!(fetched.last_contact_at, Some(days_ago(2)));
  assert_eq!(fetched.meeting_count, 1);
  assert_eq!(fetched.version, 1);
}

#[tokio::test]
async fn backdated_meeting_does_not_move_last_contact_backwards() {
  let s = store().await;
  let alice = friend(&s, &owner(), "Alice", 30, Some(days_ago(1))).await;

  s.log_meeting(&owner(), NewMeeting::new(alice.friend_id, "Old lunch", days_ago(20)))
    .await
    .unwrap();

  let fetched = s.get_friend(&owner(), alice.friend_id).await.unwrap().unwrap();
  assert_eq!(fetched.last_contact_at, Some(days_ago(1)));
  assert_eq!(fetched.meeting_count, 1);
}

#[tokio::test]
async fn log_meeting_for_foreign_friend_fails_without_writing() {
  let s = store().await;
  let alice = friend(&s, &owner(), "Alice", 30, None).await;

  let err = s
    .log_meeting(&other_owner(), NewMeeting::new(alice.friend_id, "Sneaky", days_ago(1)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::FriendNotFound(id)) if id == alice.friend_id));
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let fetched = s.get_friend(&owner(), alice.friend_id).await.unwrap().unwrap();
  assert_eq!(fetched.last_contact_at, None);
  assert_eq!(fetched.meeting_count, 0);
}

#[tokio::test]
async fn list_meetings_newest_first_with_limit() {
  let s = store().await;
  let alice = friend(&s, &owner(), "Alice", 30, None).await;
  for (title, days) in [("first", 30), ("third", 10), ("second", 20)] {
    s.log_meeting(&owner(), NewMeeting::new(alice.friend_id, title, days_ago(days)))
      .await
      .unwrap();
  }

  let all = s.list_meetings(&owner(), alice.friend_id, None).await.unwrap();
  let titles: Vec<_> = all.iter().map(|m| m.title.as_str()).collect();
  assert_eq!(titles, ["third", "second", "first"]);

  let top = s.list_meetings(&owner(), alice.friend_id, Some(2)).await.unwrap();
  assert_eq!(top.len(), 2);
  assert!(s.list_meetings(&other_owner(), alice.friend_id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_and_delete_meeting() {
  let s = store().await;
  let alice = friend(&s, &owner(), "Alice", 30, None).await;
  let meeting = s
    .log_meeting(&owner(), NewMeeting::new(alice.friend_id, "Coffee", days_ago(5)))
    .await
    .unwrap();

  let updated = s
    .update_meeting(&owner(), meeting.meeting_id, MeetingPatch {
      location: Some("Blue Bottle".into()),
      duration_minutes: Some(45),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.title, "Coffee");
  assert_eq!(updated.location.as_deref(), Some("Blue Bottle"));
  assert_eq!(updated.duration_minutes, Some(45));

  assert!(!s.delete_meeting(&other_owner(), meeting.meeting_id).await.unwrap());
  assert!(s.delete_meeting(&owner(), meeting.meeting_id).await.unwrap());
  assert!(s.list_meetings(&owner(), alice.friend_id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_friend_removes_meetings() {
  let s = store().await;
  let alice = friend(&s, &owner(), "Alice", 30, None).await;
  s.log_meeting(&owner(), NewMeeting::new(alice.friend_id, "Coffee", days_ago(5)))
    .await
    .unwrap();

  assert!(s.delete_friend(&owner(), alice.friend_id).await.unwrap());
  assert_eq!(s.count_meetings_since(&owner(), days_ago(365)).await.unwrap(), 0);
}

// ─── Coarse filter ───────────────────────────────────────────────────────────

#[tokio::test]
async fn candidates_are_oldest_first_within_cutoff() {
  let s = store().await;
  friend(&s, &owner(), "Recent", 30, Some(days_ago(5))).await;
  friend(&s, &owner(), "Never", 30, None).await;
  friend(&s, &owner(), "Older", 30, Some(days_ago(45))).await;
  friend(&s, &owner(), "Oldest", 30, Some(days_ago(90))).await;
  friend(&s, &other_owner(), "Foreign", 30, Some(days_ago(100))).await;

  let query = CandidateQuery {
    owner:            owner(),
    contacted_before: days_ago(30),
    limit:            10,
  };
  let names: Vec<_> = s
    .overdue_candidates(&query)
    .await
    .unwrap()
    .into_iter()
    .map(|f| f.name)
    .collect();
  assert_eq!(names, ["Oldest", "Older"]);

  let limited = s
    .overdue_candidates(&CandidateQuery { limit: 1, ..query })
    .await
    .unwrap();
  assert_eq!(limited.len(), 1);
  assert_eq!(limited[0].name, "Oldest");
}

#[tokio::test]
async fn min_reminder_days_ignores_never_contacted() {
  let s = store().await;
  assert_eq!(s.min_reminder_days(&owner()).await.unwrap(), None);

  friend(&s, &owner(), "Never", 1, None).await;
  assert_eq!(s.min_reminder_days(&owner()).await.unwrap(), None);

  friend(&s, &owner(), "Weekly", 7, Some(days_ago(3))).await;
  friend(&s, &owner(), "Monthly", 30, Some(days_ago(3))).await;
  assert_eq!(s.min_reminder_days(&owner()).await.unwrap(), Some(7));
}

// ─── Bulk reset ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_contacts_updates_all_matched() {
  let s = store().await;
  let a = friend(&s, &owner(), "A", 30, Some(days_ago(40))).await;
  let b = friend(&s, &owner(), "B", 7, None).await;

  let updated = s.reset_contacts(&reset(vec![a.friend_id, b.friend_id])).await.unwrap();
  assert_eq!(updated.len(), 2);
  for f in &updated {
    assert_eq!(f.last_contact_at, Some(now()));
    assert_eq!(f.version, 1);
  }
  assert_eq!(updated[0].reminder_days, 29);
  assert_eq!(updated[1].reminder_days, 6);
}

#[tokio::test]
async fn reset_contacts_clamps_at_floor() {
  let s = store().await;
  let daily = friend(&s, &owner(), "Daily", 1, Some(days_ago(3))).await;
  let weekly = friend(&s, &owner(), "Weekly", 7, Some(days_ago(3))).await;

  let updated = s.reset_contacts(&reset(vec![daily.friend_id])).await.unwrap();
  assert_eq!(updated[0].reminder_days, 1);

  let mut high_floor = reset(vec![weekly.friend_id]);
  high_floor.interval_floor = 7;
  let updated = s.reset_contacts(&high_floor).await.unwrap();
  assert_eq!(updated[0].reminder_days, 7);
}

#[tokio::test]
async fn reset_contacts_skips_foreign_and_missing_ids() {
  let s = store().await;
  let mine = friend(&s, &owner(), "Mine", 30, Some(days_ago(40))).await;
  let theirs = friend(&s, &other_owner(), "Theirs", 30, Some(days_ago(40))).await;

  let updated = s
    .reset_contacts(&reset(vec![mine.friend_id, theirs.friend_id, Uuid::new_v4()]))
    .await
    .unwrap();
  assert_eq!(updated.len(), 1);
  assert_eq!(updated[0].friend_id, mine.friend_id);

  let untouched = s.get_friend(&other_owner(), theirs.friend_id).await.unwrap().unwrap();
  assert_eq!(untouched, theirs);
}

#[tokio::test]
async fn reset_contacts_version_mismatch_rolls_back_everything() {
  let s = store().await;
  let a = friend(&s, &owner(), "A", 30, Some(days_ago(40))).await;
  let b = friend(&s, &owner(), "B", 30, Some(days_ago(40))).await;

  let mut stale = reset(vec![a.friend_id, b.friend_id]);
  stale.expected_versions.insert(a.friend_id, 0);
  stale.expected_versions.insert(b.friend_id, 5);

  let err = s.reset_contacts(&stale).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::VersionConflict { friend_id, expected: 5, actual: 0 })
      if friend_id == b.friend_id
  ));
  assert_eq!(err.kind(), ErrorKind::Conflict);

  assert_eq!(s.get_friend(&owner(), a.friend_id).await.unwrap().unwrap(), a);
  assert_eq!(s.get_friend(&owner(), b.friend_id).await.unwrap().unwrap(), b);
}

// ─── Pipeline: overdue summary ───────────────────────────────────────────────

#[tokio::test]
async fn summary_applies_per_friend_interval() {
  let s = store().await;
  let f1 = friend(&s, &owner(), "F1", 30, Some(days_ago(40))).await;
  friend(&s, &owner(), "F2", 60, Some(days_ago(40))).await;
  friend(&s, &owner(), "Never", 30, None).await;

  let summary = service(&s, ReminderConfig::default())
    .overdue_summary(&owner(), now())
    .await
    .unwrap();

  assert_eq!(summary.total_friends, 3);
  assert_eq!(summary.candidates_checked, 2);
  assert_eq!(summary.overdue_count, 1);
  let entry = &summary.overdue[0];
  assert_eq!(entry.friend_id, f1.friend_id);
  assert_eq!(entry.days_since_contact, 40);
  assert_eq!(entry.days_overdue, 10);
  assert_eq!(entry.message, "Reach out to F1! (40 days)");
}

#[tokio::test]
async fn summary_for_empty_owner() {
  let s = store().await;
  let summary = service(&s, ReminderConfig::default())
    .overdue_summary(&owner(), now())
    .await
    .unwrap();
  assert_eq!(summary.total_friends, 0);
  assert_eq!(summary.candidates_checked, 0);
  assert!(summary.overdue.is_empty());
}

#[tokio::test]
async fn derived_lookback_catches_short_intervals() {
  let s = store().await;
  let f3 = friend(&s, &owner(), "F3", 7, Some(days_ago(10))).await;
  friend(&s, &owner(), "Monthly", 30, Some(days_ago(10))).await;

  let svc = service(&s, ReminderConfig::default());
  let summary = svc.overdue_summary(&owner(), now()).await.unwrap();
  assert_eq!(summary.overdue_count, 1);
  assert_eq!(summary.overdue[0].friend_id, f3.friend_id);

  let page = svc.list_overdue(&owner(), PageRequest::default(), now()).await.unwrap();
  assert_eq!(page.entries.len(), 1);
  assert_eq!(page.entries[0].days_overdue, 3);
}

#[tokio::test]
async fn fixed_lookback_longer_than_interval_misses_overdue_friend() {
  let s = store().await;
  friend(&s, &owner(), "F3", 7, Some(days_ago(10))).await;

  let config = ReminderConfig {
    lookback: Lookback::Fixed { days: 30 },
    ..Default::default()
  };
  let page = service(&s, config)
    .list_overdue(&owner(), PageRequest::default(), now())
    .await
    .unwrap();
  assert!(page.entries.is_empty());
  assert_eq!(page.total_overdue, 0);
}

#[tokio::test]
async fn unrepresentable_window_fails_cleanly() {
  let s = store().await;
  friend(&s, &owner(), "F1", 30, Some(days_ago(45))).await;

  let config = ReminderConfig {
    lookback: Lookback::Fixed { days: u32::MAX },
    stats_window_days: u32::MAX,
    ..Default::default()
  };
  let svc = service(&s, config);
  let err = svc.overdue_summary(&owner(), now()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Invalid);
  let err = svc.stats(&owner(), now()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Invalid);
}

// ─── Pipeline: paginated list ────────────────────────────────────────────────

#[tokio::test]
async fn list_overdue_is_oldest_first_and_bounded() {
  let s = store().await;
  for i in 0..25 {
    friend(&s, &owner(), &format!("F{i:02}"), 7, Some(days_ago(10 + i))).await;
  }
  friend(&s, &owner(), "Fresh", 7, Some(days_ago(1))).await;

  let page = service(&s, ReminderConfig::default())
    .list_overdue(&owner(), PageRequest::new(Some(20), Some(0)).unwrap(), now())
    .await
    .unwrap();

  assert_eq!(page.entries.len(), 20);
  assert!(page.has_next_page);
  let days: Vec<_> = page.entries.iter().map(|e| e.days_since_contact).collect();
  let mut sorted = days.clone();
  sorted.sort_unstable_by(|a, b| b.cmp(a));
  assert_eq!(days, sorted, "entries must run from least to most recently contacted");
  assert_eq!(page.entries[0].friend_name, "F24");
  assert_eq!(page.next_cursor, Some(page.entries[19].friend_id));
}

#[tokio::test]
async fn has_next_page_tracks_full_pages() {
  let take = 5;
  for (overdue, expect_next) in [(take, true), (take - 1, false)] {
    let s = store().await;
    for i in 0..overdue {
      friend(&s, &owner(), &format!("O{i}"), 7, Some(days_ago(20 + i as i64))).await;
    }
    let page = service(&s, ReminderConfig::default())
      .list_overdue(&owner(), PageRequest::new(Some(take), None).unwrap(), now())
      .await
      .unwrap();
    assert_eq!(page.entries.len(), overdue);
    assert_eq!(page.has_next_page, expect_next, "overdue={overdue}");
  }
}

#[tokio::test]
async fn skip_pages_through_the_list() {
  let s = store().await;
  for i in 0..7 {
    friend(&s, &owner(), &format!("F{i}"), 7, Some(days_ago(30 - i))).await;
  }
  let svc = service(&s, ReminderConfig::default());

  let first = svc
    .list_overdue(&owner(), PageRequest::new(Some(4), Some(0)).unwrap(), now())
    .await
    .unwrap();
  let second = svc
    .list_overdue(&owner(), PageRequest::new(Some(4), Some(4)).unwrap(), now())
    .await
    .unwrap();

  let names: Vec<_> = first
    .entries
    .iter()
    .chain(&second.entries)
    .map(|e| e.friend_name.as_str())
    .collect();
  assert_eq!(names, ["F0", "F1", "F2", "F3", "F4", "F5", "F6"]);
  assert!(first.has_next_page);
  assert!(!second.has_next_page);
}

/// Stale friends with long intervals sort ahead of the genuinely overdue ones
/// and fill the initial fetch.
async fn crowded_owner(s: &SqliteStore) {
  for i in 0..30 {
    friend(s, &owner(), &format!("Yearly{i:02}"), 365, Some(days_ago(100 + i))).await;
  }
  for i in 0..5 {
    friend(s, &owner(), &format!("Daily{i}"), 1, Some(days_ago(2 + i))).await;
  }
}

#[tokio::test]
async fn list_overdue_widens_past_non_overdue_candidates() {
  let s = store().await;
  crowded_owner(&s).await;

  let page = service(&s, ReminderConfig::default())
    .list_overdue(&owner(), PageRequest::new(Some(5), None).unwrap(), now())
    .await
    .unwrap();

  assert_eq!(page.entries.len(), 5);
  assert!(page.has_next_page);
  assert!(page.entries.iter().all(|e| e.friend_name.starts_with("Daily")));
  assert_eq!(page.entries[0].friend_name, "Daily4");
}

#[tokio::test]
async fn without_widening_the_buffer_can_starve_a_page() {
  let s = store().await;
  crowded_owner(&s).await;

  let config = ReminderConfig { max_widening_rounds: 0, ..Default::default() };
  let page = service(&s, config)
    .list_overdue(&owner(), PageRequest::new(Some(5), None).unwrap(), now())
    .await
    .unwrap();

  assert!(page.entries.is_empty());
  assert!(!page.has_next_page);
}

#[tokio::test]
async fn list_overdue_is_owner_scoped() {
  let s = store().await;
  friend(&s, &other_owner(), "Theirs", 7, Some(days_ago(50))).await;
  friend(&s, &owner(), "Mine", 30, Some(days_ago(5))).await;

  let page = service(&s, ReminderConfig::default())
    .list_overdue(&owner(), PageRequest::default(), now())
    .await
    .unwrap();
  assert!(page.entries.is_empty());
}

// ─── Pipeline: stats ─────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_for_empty_owner_are_zero() {
  let s = store().await;
  let stats = service(&s, ReminderConfig::default())
    .stats(&owner(), now())
    .await
    .unwrap();
  assert_eq!(stats, StatsSnapshot {
    total_friends:      0,
    avg_reminder_days:  0,
    overdue_count:      0,
    active_this_month:  0,
    overdue_percentage: 0,
  });
}

#[tokio::test]
async fn stats_use_coarse_thirty_day_window() {
  let s = store().await;
  let alice = friend(&s, &owner(), "Alice", 30, Some(days_ago(45))).await;
  // Overdue by its own interval but inside the window: not counted here.
  let bob = friend(&s, &owner(), "Bob", 7, Some(days_ago(10))).await;
  friend(&s, &owner(), "Charlie", 60, None).await;
  friend(&s, &other_owner(), "Foreign", 30, Some(days_ago(90))).await;

  s.log_meeting(&owner(), NewMeeting::new(alice.friend_id, "Old", days_ago(45)))
    .await
    .unwrap();
  s.log_meeting(&owner(), NewMeeting::new(bob.friend_id, "Recent", days_ago(10)))
    .await
    .unwrap();

  let stats = service(&s, ReminderConfig::default())
    .stats(&owner(), now())
    .await
    .unwrap();

  assert_eq!(stats.total_friends, 3);
  assert_eq!(stats.avg_reminder_days, 32);
  assert_eq!(stats.overdue_count, 1);
  assert_eq!(stats.active_this_month, 1);
  assert_eq!(stats.overdue_percentage, 33);
}

// ─── Pipeline: bulk mark contacted ───────────────────────────────────────────

#[tokio::test]
async fn bulk_mark_contacted_resets_and_decrements() {
  let s = store().await;
  let a = friend(&s, &owner(), "A", 30, Some(days_ago(40))).await;
  let b = friend(&s, &owner(), "B", 1, Some(days_ago(3))).await;

  let svc = service(&s, ReminderConfig::default());
  let updated = svc
    .bulk_mark_contacted(&owner(), MarkContacted::new([a.friend_id, b.friend_id]), now())
    .await
    .unwrap();

  assert_eq!(updated.len(), 2);
  let a2 = s.get_friend(&owner(), a.friend_id).await.unwrap().unwrap();
  let b2 = s.get_friend(&owner(), b.friend_id).await.unwrap().unwrap();
  assert_eq!(a2.last_contact_at, Some(now()));
  assert_eq!(b2.last_contact_at, Some(now()));
  assert_eq!(a2.reminder_days, 29);
  assert_eq!(b2.reminder_days, 1, "clamped at the floor");

  let summary = svc.overdue_summary(&owner(), now()).await.unwrap();
  assert_eq!(summary.overdue_count, 0);
}

#[tokio::test]
async fn bulk_mark_contacted_silently_skips_foreign_ids() {
  let s = store().await;
  let mine = friend(&s, &owner(), "Mine", 30, Some(days_ago(40))).await;
  let theirs = friend(&s, &other_owner(), "Theirs", 30, Some(days_ago(40))).await;

  let updated = service(&s, ReminderConfig::default())
    .bulk_mark_contacted(
      &owner(),
      MarkContacted::new([mine.friend_id, theirs.friend_id]),
      now(),
    )
    .await
    .unwrap();

  assert_eq!(updated.len(), 1);
  assert_eq!(updated[0].friend_id, mine.friend_id);
  let theirs_after = s.get_friend(&other_owner(), theirs.friend_id).await.unwrap().unwrap();
  assert_eq!(theirs_after.reminder_days, 30);
  assert_eq!(theirs_after.last_contact_at, Some(days_ago(40)));
}

#[tokio::test]
async fn bulk_mark_contacted_rejects_bad_input_before_writing() {
  let s = store().await;
  let a = friend(&s, &owner(), "A", 30, Some(days_ago(40))).await;
  let svc = service(&s, ReminderConfig::default());

  let empty = svc
    .bulk_mark_contacted(&owner(), MarkContacted::default(), now())
    .await
    .unwrap_err();
  assert!(matches!(empty, ServiceError::Core(CoreError::Validation(_))));

  let mut too_many: Vec<Uuid> = (0..100).map(|_| Uuid::new_v4()).collect();
  too_many.push(a.friend_id);
  let err = svc
    .bulk_mark_contacted(&owner(), MarkContacted::new(too_many), now())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Invalid);

  assert_eq!(s.get_friend(&owner(), a.friend_id).await.unwrap().unwrap(), a);
}

#[tokio::test]
async fn bulk_mark_contacted_detects_concurrent_update() {
  let s = store().await;
  let a = friend(&s, &owner(), "A", 30, Some(days_ago(40))).await;
  let svc = service(&s, ReminderConfig::default());

  let mut first = MarkContacted::new([a.friend_id]);
  first.expected_versions.insert(a.friend_id, a.version);
  svc.bulk_mark_contacted(&owner(), first.clone(), now()).await.unwrap();

  // A second session still holding the original version loses.
  let err = svc.bulk_mark_contacted(&owner(), first, now()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
  let after = s.get_friend(&owner(), a.friend_id).await.unwrap().unwrap();
  assert_eq!(after.reminder_days, 29);
}

// ─── Service: directory ──────────────────────────────────────────────────────

#[tokio::test]
async fn service_attaches_recent_meetings() {
  let s = store().await;
  let svc = service(&s, ReminderConfig::default());
  let alice = svc.add_friend(&owner(), NewFriend::new("Alice")).await.unwrap();
  for i in 0..12 {
    svc
      .log_meeting(&owner(), NewMeeting::new(alice.friend_id, format!("M{i}"), days_ago(i)))
      .await
      .unwrap();
  }

  let listed = svc.list_friends(&owner()).await.unwrap();
  assert_eq!(listed[0].recent_meetings.len(), 3);
  assert_eq!(listed[0].recent_meetings[0].title, "M0");
  assert_eq!(listed[0].friend.meeting_count, 12);

  let detail = svc.get_friend(&owner(), alice.friend_id).await.unwrap().unwrap();
  assert_eq!(detail.recent_meetings.len(), 10);
  assert!(svc.get_friend(&other_owner(), alice.friend_id).await.unwrap().is_none());
}

#[tokio::test]
async fn service_validates_friend_input() {
  let s = store().await;
  let svc = service(&s, ReminderConfig::default());

  let mut input = NewFriend::new("Alice");
  input.reminder_days = 366;
  assert!(matches!(
    svc.add_friend(&owner(), input).await,
    Err(ServiceError::Core(CoreError::Validation(_)))
  ));
  assert!(s.list_friends(&owner()).await.unwrap().is_empty());

  let bob = svc.add_friend(&owner(), NewFriend::new("Bob")).await.unwrap();
  let patch = FriendPatch { reminder_days: Some(0), ..Default::default() };
  assert!(svc.update_friend(&owner(), bob.friend_id, patch).await.is_err());
}

#[tokio::test]
async fn out_of_range_timestamps_never_reach_the_store() {
  let s = store().await;
  let svc = service(&s, ReminderConfig::default());
  friend(&s, &owner(), "Ok", 7, Some(days_ago(10))).await;
  let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();

  let mut input = NewFriend::new("Future");
  input.last_contact_at = Some(far);
  assert!(matches!(
    svc.add_friend(&owner(), input).await,
    Err(ServiceError::Core(CoreError::Validation(_)))
  ));

  let ok = s.list_friends(&owner()).await.unwrap();
  assert_eq!(ok.len(), 1);
  assert!(matches!(
    svc.log_meeting(&owner(), NewMeeting::new(ok[0].friend_id, "Later", far)).await,
    Err(ServiceError::Core(CoreError::Validation(_)))
  ));

  let summary = svc.overdue_summary(&owner(), now()).await.unwrap();
  assert_eq!(summary.overdue_count, 1);
  let stats = svc.stats(&owner(), now()).await.unwrap();
  assert_eq!(stats.overdue_count, 0);
  assert_eq!(stats.total_friends, 1);
}

#[tokio::test]
async fn empty_patch_does_not_bump_version() {
  let s = store().await;
  let svc = service(&s, ReminderConfig::default());
  let bob = svc.add_friend(&owner(), NewFriend::new("Bob")).await.unwrap();

  let unchanged = svc
    .update_friend(&owner(), bob.friend_id, FriendPatch::default())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(unchanged, bob);
  assert!(
    svc
      .update_friend(&other_owner(), bob.friend_id, FriendPatch::default())
      .await
      .unwrap()
      .is_none()
  );
}
