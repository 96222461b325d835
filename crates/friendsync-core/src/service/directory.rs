//! Friend and meeting management: validation in front of the store.

use uuid::Uuid;

use super::{FriendService, ServiceResult};
use crate::{
  ServiceError,
  friend::{Friend, FriendDetail, FriendPatch, NewFriend, OwnerId},
  meeting::{Meeting, MeetingPatch, NewMeeting},
  store::ContactStore,
};

/// Recent meetings shown alongside each friend in the list view.
pub const LIST_RECENT_MEETINGS: usize = 3;
/// Recent meetings shown on a single friend.
pub const DETAIL_RECENT_MEETINGS: usize = 10;

impl<S: ContactStore> FriendService<S> {
  pub async fn add_friend(
    &self,
    owner: &OwnerId,
    input: NewFriend,
  ) -> ServiceResult<Friend, S> {
    input.validate()?;
    let friend = self
      .store
      .add_friend(owner, input)
      .await
      .map_err(ServiceError::Store)?;
    tracing::info!(%owner, friend_id = %friend.friend_id, "added friend");
    Ok(friend)
  }

  pub async fn list_friends(
    &self,
    owner: &OwnerId,
  ) -> ServiceResult<Vec<FriendDetail>, S> {
    let friends = self
      .config
      .retry
      .run("list_friends", || self.store.list_friends(owner))
      .await
      .map_err(ServiceError::Store)?;

    let mut details = Vec::with_capacity(friends.len());
    for friend in friends {
      details.push(self.with_recent_meetings(owner, friend, LIST_RECENT_MEETINGS).await?);
    }
    Ok(details)
  }

  pub async fn get_friend(
    &self,
    owner: &OwnerId,
    id: Uuid,
  ) -> ServiceResult<Option<FriendDetail>, S> {
    let friend = self
      .config
      .retry
      .run("get_friend", || self.store.get_friend(owner, id))
      .await
      .map_err(ServiceError::Store)?;

    match friend {
      Some(friend) => Ok(Some(
        self.with_recent_meetings(owner, friend, DETAIL_RECENT_MEETINGS).await?,
      )),
      None => Ok(None),
    }
  }

  async fn with_recent_meetings(
    &self,
    owner: &OwnerId,
    friend: Friend,
    limit: usize,
  ) -> ServiceResult<FriendDetail, S> {
    let recent_meetings = self
      .config
      .retry
      .run("list_meetings", || {
        self.store.list_meetings(owner, friend.friend_id, Some(limit))
      })
      .await
      .map_err(ServiceError::Store)?;
    Ok(FriendDetail { friend, recent_meetings })
  }

  pub async fn update_friend(
    &self,
    owner: &OwnerId,
    id: Uuid,
    patch: FriendPatch,
  ) -> ServiceResult<Option<Friend>, S> {
    patch.validate()?;
    // Nothing to write; don't bump the version.
    if patch.is_empty() {
      return self
        .config
        .retry
        .run("get_friend", || self.store.get_friend(owner, id))
        .await
        .map_err(ServiceError::Store);
    }
    self
      .store
      .update_friend(owner, id, patch)
      .await
      .map_err(ServiceError::Store)
  }

  pub async fn delete_friend(&self, owner: &OwnerId, id: Uuid) -> ServiceResult<bool, S> {
    let deleted = self
      .store
      .delete_friend(owner, id)
      .await
      .map_err(ServiceError::Store)?;
    if deleted {
      tracing::info!(%owner, friend_id = %id, "deleted friend");
    }
    Ok(deleted)
  }

  /// Log a meeting; the friend's last contact moves to the meeting date.
  pub async fn log_meeting(
    &self,
    owner: &OwnerId,
    input: NewMeeting,
  ) -> ServiceResult<Meeting, S> {
    input.validate()?;
    self
      .store
      .log_meeting(owner, input)
      .await
      .map_err(ServiceError::Store)
  }

  pub async fn list_meetings(
    &self,
    owner: &OwnerId,
    friend_id: Uuid,
  ) -> ServiceResult<Vec<Meeting>, S> {
    self
      .config
      .retry
      .run("list_meetings", || self.store.list_meetings(owner, friend_id, None))
      .await
      .map_err(ServiceError::Store)
  }

  pub async fn update_meeting(
    &self,
    owner: &OwnerId,
    id: Uuid,
    patch: MeetingPatch,
  ) -> ServiceResult<Option<Meeting>, S> {
    patch.validate()?;
    self
      .store
      .update_meeting(owner, id, patch)
      .await
      .map_err(ServiceError::Store)
  }

  pub async fn delete_meeting(&self, owner: &OwnerId, id: Uuid) -> ServiceResult<bool, S> {
    self
      .store
      .delete_meeting(owner, id)
      .await
      .map_err(ServiceError::Store)
  }
}
