//! `StatsAggregator` — point-in-time stats for one or many subjects.
//!
//! Likes and comments are counted live. Views come from the snapshot row
//! because no other record of them exists. Missing rows read as zero.

use std::{collections::BTreeMap, sync::Arc};

use futures::future::join_all;

use crate::{
  Error, Result,
  engagement::{Counts, EngagementStats},
  identity::Identity,
  store::EngagementStore,
  subject::Subject,
};

pub struct StatsAggregator<S> {
  store: Arc<S>,
}

impl<S> Clone for StatsAggregator<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: EngagementStore> StatsAggregator<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Stats for `subject` as seen by `identity`.
  ///
  /// `is_liked` is `false` when no identity was resolved, and also when the
  /// existence check fails: stats reads must succeed for anonymous browsing.
  pub async fn compute_stats(
    &self,
    subject: &Subject,
    identity: Option<&Identity>,
  ) -> Result<EngagementStats> {
    let counts = self.counts(subject).await?;

    let is_liked = match identity {
      Some(identity) => self
        .store
        .like_exists(subject, identity)
        .await
        .unwrap_or_else(|e| {
          tracing::warn!(%subject, %identity, error = %e, "like lookup failed");
          false
        }),
      None => false,
    };

    Ok(EngagementStats {
      likes: counts.likes,
      comments: counts.comments,
      views: counts.views,
      is_liked,
    })
  }

  /// Counts for many subjects, keyed by subject id.
  ///
  /// Subjects are aggregated concurrently. A failure on one subject is logged
  /// and recorded as zeroed counts; the rest of the batch is unaffected.
  pub async fn compute_stats_for_many(
    &self,
    subjects: &[Subject],
  ) -> BTreeMap<String, Counts> {
    let results = join_all(subjects.iter().map(|s| self.counts(s))).await;

    subjects
      .iter()
      .zip(results)
      .map(|(subject, result)| {
        let counts = result.unwrap_or_else(|e| {
          tracing::warn!(%subject, error = %e, "stats aggregation failed, reporting zeros");
          Counts::default()
        });
        (subject.id.clone(), counts)
      })
      .collect()
  }

  async fn counts(&self, subject: &Subject) -> Result<Counts> {
    let likes = self
      .store
      .count_likes(subject)
      .await
      .map_err(Error::internal)?;
    let comments = self
      .store
      .count_comments(subject)
      .await
      .map_err(Error::internal)?;
    let views = self
      .store
      .get_snapshot(subject)
      .await
      .map_err(Error::internal)?
      .map_or(0, |s| s.view_count);

    Ok(Counts { likes, comments, views })
  }
}
