//! The overdue-reminder pipeline.
//!
//! ```text
//! store ── coarse filter ──▶ recency check ──▶ { paginate | summarise }
//! ```
//!
//! The coarse filter is a cheap storage-side range query on
//! `last_contact_at`. It cannot express the per-friend interval, so it only
//! bounds the candidate set; [`OverdueEntry::evaluate`] makes the real call.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{FriendService, ServiceResult};
use crate::{
  Error, ServiceError,
  config::Lookback,
  friend::{Friend, OwnerId},
  paginate::{PageRequest, PageResult, window},
  recency::{OverdueEntry, overdue_entries},
  stats::StatsSnapshot,
  store::{CandidateQuery, ContactReset, ContactStore},
};

/// Largest number of ids a single bulk reset accepts.
pub const MAX_BULK_IDS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueSummary {
  pub total_friends:      u64,
  pub candidates_checked: usize,
  pub overdue_count:      usize,
  pub overdue:            Vec<OverdueEntry>,
}

/// Input to [`FriendService::bulk_mark_contacted`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkContacted {
  pub friend_ids:        Vec<Uuid>,
  /// Optional per-friend versions; a mismatch aborts the whole batch.
  #[serde(default)]
  pub expected_versions: HashMap<Uuid, i64>,
}

impl MarkContacted {
  pub fn new(friend_ids: impl IntoIterator<Item = Uuid>) -> Self {
    Self { friend_ids: friend_ids.into_iter().collect(), ..Default::default() }
  }

  pub fn validate(&self) -> crate::Result<()> {
    if self.friend_ids.is_empty() || self.friend_ids.len() > MAX_BULK_IDS {
      return Err(Error::validation(format!(
        "friend_ids must contain between 1 and {MAX_BULK_IDS} ids, got {}",
        self.friend_ids.len()
      )));
    }
    let mut seen = HashSet::with_capacity(self.friend_ids.len());
    if let Some(dup) = self.friend_ids.iter().find(|id| !seen.insert(**id)) {
      return Err(Error::validation(format!("duplicate friend id {dup}")));
    }
    if let Some(stray) = self.expected_versions.keys().find(|id| !seen.contains(*id)) {
      return Err(Error::validation(format!(
        "expected version given for {stray}, which is not in friend_ids"
      )));
    }
    Ok(())
  }
}

impl<S: ContactStore> FriendService<S> {
  /// The cutoff for the coarse filter, or `None` if the owner has no
  /// contacted friends and the filter can only come back empty.
  async fn coarse_cutoff(
    &self,
    owner: &OwnerId,
    now: DateTime<Utc>,
  ) -> ServiceResult<Option<DateTime<Utc>>, S> {
    let days = match self.config.lookback {
      Lookback::Fixed { days } => days,
      Lookback::MinInterval => {
        let min = self
          .config
          .retry
          .run("min_reminder_days", || self.store.min_reminder_days(owner))
          .await
          .map_err(ServiceError::Store)?;
        match min {
          Some(days) => days,
          None => return Ok(None),
        }
      }
    };
    Ok(Some(days_before(now, days)?))
  }

  async fn candidates(
    &self,
    owner: &OwnerId,
    contacted_before: DateTime<Utc>,
    limit: usize,
  ) -> ServiceResult<Vec<Friend>, S> {
    let query = CandidateQuery { owner: owner.clone(), contacted_before, limit };
    self
      .config
      .retry
      .run("overdue_candidates", || self.store.overdue_candidates(&query))
      .await
      .map_err(ServiceError::Store)
  }

  /// Every overdue friend among the oldest `summary_candidate_limit`
  /// candidates.
  pub async fn overdue_summary(
    &self,
    owner: &OwnerId,
    now: DateTime<Utc>,
  ) -> ServiceResult<OverdueSummary, S> {
    let total_friends = self
      .config
      .retry
      .run("count_friends", || self.store.count_friends(owner))
      .await
      .map_err(ServiceError::Store)?;

    let candidates = match self.coarse_cutoff(owner, now).await? {
      Some(cutoff) => {
        self
          .candidates(owner, cutoff, self.config.summary_candidate_limit)
          .await?
      }
      None => Vec::new(),
    };

    let overdue = overdue_entries(&candidates, now);
    debug!(
      %owner,
      total_friends,
      candidates = candidates.len(),
      overdue = overdue.len(),
      "overdue summary"
    );

    Ok(OverdueSummary {
      total_friends,
      candidates_checked: candidates.len(),
      overdue_count: overdue.len(),
      overdue,
    })
  }

  /// One page of overdue friends, least recently contacted first.
  ///
  /// The precise filter runs after the fetch, so the fetch overshoots by
  /// `page_buffer`. If that still leaves the page short while the store had
  /// more rows, the cap doubles and the fetch repeats, up to
  /// `max_widening_rounds` times.
  pub async fn list_overdue(
    &self,
    owner: &OwnerId,
    page: PageRequest,
    now: DateTime<Utc>,
  ) -> ServiceResult<PageResult, S> {
    let Some(cutoff) = self.coarse_cutoff(owner, now).await? else {
      return Ok(window(Vec::new(), page));
    };

    let mut cap = page.end().saturating_add(self.config.page_buffer);
    let mut round = 0;
    loop {
      let candidates = self.candidates(owner, cutoff, cap).await?;
      let exhausted = candidates.len() < cap;
      let overdue = overdue_entries(&candidates, now);
      debug!(%owner, round, cap, candidates = candidates.len(), overdue = overdue.len(), "overdue page fetch");

      if overdue.len() >= page.end() || exhausted {
        return Ok(window(overdue, page));
      }
      if round >= self.config.max_widening_rounds {
        warn!(%owner, cap, "widening limit reached; overdue page may be incomplete");
        return Ok(window(overdue, page));
      }
      round += 1;
      cap = cap.saturating_mul(2);
    }
  }

  pub async fn stats(
    &self,
    owner: &OwnerId,
    now: DateTime<Utc>,
  ) -> ServiceResult<StatsSnapshot, S> {
    let since = days_before(now, self.config.stats_window_days)?;

    let aggregate = self
      .config
      .retry
      .run("friend_aggregate", || self.store.friend_aggregate(owner, since))
      .await
      .map_err(ServiceError::Store)?;
    let recent_meetings = self
      .config
      .retry
      .run("count_meetings_since", || self.store.count_meetings_since(owner, since))
      .await
      .map_err(ServiceError::Store)?;

    Ok(StatsSnapshot::from_parts(aggregate, recent_meetings))
  }

  /// Mark friends as contacted `now` and shrink their intervals by a day, in
  /// one transaction.
  ///
  /// Ids that are missing or belong to another owner are skipped silently;
  /// the result holds exactly the friends that were updated. Never retried.
  pub async fn bulk_mark_contacted(
    &self,
    owner: &OwnerId,
    input: MarkContacted,
    now: DateTime<Utc>,
  ) -> ServiceResult<Vec<Friend>, S> {
    input.validate()?;

    let requested = input.friend_ids.len();
    let reset = ContactReset {
      owner:             owner.clone(),
      friend_ids:        input.friend_ids,
      expected_versions: input.expected_versions,
      contacted_at:      now,
      interval_floor:    self.config.interval_floor,
    };

    let updated = self
      .store
      .reset_contacts(&reset)
      .await
      .map_err(ServiceError::Store)?;

    info!(%owner, requested, updated = updated.len(), "marked friends as contacted");
    Ok(updated)
  }
}

/// `now` minus `days`, or a validation error if that leaves chrono's range.
fn days_before(now: DateTime<Utc>, days: u32) -> crate::Result<DateTime<Utc>> {
  now
    .checked_sub_signed(Duration::days(i64::from(days)))
    .ok_or_else(|| Error::validation(format!("a {days}-day window before {now} is out of range")))
}
