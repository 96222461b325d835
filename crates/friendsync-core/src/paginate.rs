//! Windowing of the overdue list for page-by-page delivery.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, recency::OverdueEntry};

pub const DEFAULT_TAKE: usize = 20;
pub const MAX_TAKE: usize = 50;

/// A validated page request: `take` in `1..=MAX_TAKE`, any `skip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  take: usize,
  skip: usize,
}

impl PageRequest {
  pub fn new(take: Option<usize>, skip: Option<usize>) -> Result<Self> {
    let take = take.unwrap_or(DEFAULT_TAKE);
    if !(1..=MAX_TAKE).contains(&take) {
      return Err(Error::validation(format!(
        "take must be between 1 and {MAX_TAKE}, got {take}"
      )));
    }
    Ok(Self { take, skip: skip.unwrap_or(0) })
  }

  pub fn take(&self) -> usize { self.take }

  pub fn skip(&self) -> usize { self.skip }

  /// Number of overdue entries needed to fill this page.
  pub fn end(&self) -> usize { self.skip.saturating_add(self.take) }
}

impl Default for PageRequest {
  fn default() -> Self { Self { take: DEFAULT_TAKE, skip: 0 } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
  pub entries:       Vec<OverdueEntry>,
  /// Overdue entries found within the fetched candidate window. Not a global
  /// count.
  pub total_overdue: usize,
  /// `true` iff the page was filled.
  pub has_next_page: bool,
  /// Id of the last entry on the page.
  pub next_cursor:   Option<Uuid>,
}

/// Cut `page` out of an already ordered overdue list.
pub fn window(overdue: Vec<OverdueEntry>, page: PageRequest) -> PageResult {
  let total_overdue = overdue.len();
  let entries: Vec<OverdueEntry> =
    overdue.into_iter().skip(page.skip).take(page.take).collect();

  PageResult {
    total_overdue,
    has_next_page: entries.len() == page.take,
    next_cursor: entries.last().map(|e| e.friend_id),
    entries,
  }
}
