//! `LikeLedger` — deduplicated like records.
//!
//! Deduplication is delegated entirely to the store's uniqueness constraint.
//! Two simultaneous likes from the same identity produce one record; the
//! loser observes `created = false`.

use std::sync::Arc;

use crate::{
  Error, Result,
  cache::StatsCache,
  engagement::{LikeOutcome, LikeRecord, ToggleOutcome},
  identity::Identity,
  store::EngagementStore,
  subject::{Subject, SubjectKind},
};

pub struct LikeLedger<S> {
  store: Arc<S>,
  cache: StatsCache<S>,
}

impl<S> Clone for LikeLedger<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), cache: self.cache.clone() }
  }
}

impl<S> LikeLedger<S>
where
  S: EngagementStore + 'static,
{
  pub fn new(store: Arc<S>, cache: StatsCache<S>) -> Self { Self { store, cache } }

  /// Record a like unless `identity` already liked `subject`.
  ///
  /// The returned total is counted live after the insert attempt. A cache
  /// refresh is scheduled only when a record was actually created.
  pub async fn try_like(&self, subject: &Subject, identity: &Identity) -> Result<LikeOutcome> {
    self.ensure_exists(subject).await?;

    let outcome = self
      .store
      .insert_like(subject, identity)
      .await
      .map_err(Error::internal)?;

    tracing::debug!(
      %subject,
      %identity,
      created = outcome.created,
      total = outcome.total_likes,
      "like recorded"
    );

    if outcome.created {
      self.cache.refresh_after_like(subject.clone());
    }
    Ok(outcome)
  }

  /// Like if absent, unlike if present. Only comment likes may be toggled;
  /// post likes are one-shot.
  pub async fn toggle_like(
    &self,
    subject: &Subject,
    identity: &Identity,
  ) -> Result<ToggleOutcome> {
    if subject.kind != SubjectKind::Comment {
      return Err(Error::Validation(format!(
        "likes on {subject} cannot be toggled"
      )));
    }
    self.ensure_exists(subject).await?;

    let outcome = self
      .store
      .toggle_like(subject, identity)
      .await
      .map_err(Error::internal)?;

    tracing::debug!(
      %subject,
      %identity,
      liked = outcome.liked,
      total = outcome.total_likes,
      "like toggled"
    );

    self.cache.refresh_after_like(subject.clone());
    Ok(outcome)
  }

  pub async fn exists(&self, subject: &Subject, identity: &Identity) -> Result<bool> {
    self
      .store
      .like_exists(subject, identity)
      .await
      .map_err(Error::internal)
  }

  /// Live like count for `subject`.
  pub async fn count(&self, subject: &Subject) -> Result<i64> {
    self.store.count_likes(subject).await.map_err(Error::internal)
  }

  /// Every like record for `subject`, oldest first.
  pub async fn likes(&self, subject: &Subject) -> Result<Vec<LikeRecord>> {
    self.store.list_likes(subject).await.map_err(Error::internal)
  }

  /// Posts are created implicitly; comments must already exist in the
  /// content store.
  async fn ensure_exists(&self, subject: &Subject) -> Result<()> {
    match subject.kind {
      SubjectKind::Post => Ok(()),
      SubjectKind::Comment => {
        let exists = self
          .store
          .comment_exists(&subject.id)
          .await
          .map_err(Error::internal)?;
        if exists {
          Ok(())
        } else {
          Err(Error::SubjectNotFound(subject.clone()))
        }
      }
    }
  }
}
