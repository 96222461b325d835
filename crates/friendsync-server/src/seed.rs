//! Demo data for a fresh install.

use friendsync_core::{
  ServiceError,
  friend::{Friend, NewFriend, OwnerId},
  service::FriendService,
  store::ContactStore,
};

/// `(name, email, phone, reminder_days)` for each demo friend.
const DEMO_FRIENDS: [(&str, Option<&str>, Option<&str>, u32); 5] = [
  ("Alice Johnson", Some("alice@work.com"), Some("+1-555-0101"), 30),
  ("Bob Smith", Some("bob@friend.com"), Some("+1-555-0102"), 7),
  ("Charlie Davis", Some("charlie@casual.com"), None, 60),
  ("Diana Evans", None, None, 180),
  ("Eric Foster", None, None, 14),
];

/// Replace `owner`'s friends with the demo set.
pub async fn seed<S: ContactStore>(
  service: &FriendService<S>,
  owner: &OwnerId,
) -> Result<Vec<Friend>, ServiceError<S::Error>> {
  let existing = service.list_friends(owner).await?;
  for detail in &existing {
    service.delete_friend(owner, detail.friend.friend_id).await?;
  }

  let mut added = Vec::with_capacity(DEMO_FRIENDS.len());
  for (name, email, phone, reminder_days) in DEMO_FRIENDS {
    let mut input = NewFriend::new(name);
    input.email = email.map(str::to_owned);
    input.phone = phone.map(str::to_owned);
    input.reminder_days = reminder_days;
    added.push(service.add_friend(owner, input).await?);
  }

  tracing::info!(%owner, cleared = existing.len(), added = added.len(), "seeded demo friends");
  Ok(added)
}
