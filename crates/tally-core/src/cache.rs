//! `StatsCache` — best-effort maintenance of the denormalized snapshot rows.
//!
//! Refreshes run on spawned tasks and never report failure to the request
//! that triggered them. A lost refresh is healed by the next mutation on the
//! same subject; live reads never depend on this cache except for views.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::{
  Error, Result,
  engagement::{SnapshotUpdate, StatsSnapshot},
  store::EngagementStore,
  subject::Subject,
};

pub struct StatsCache<S> {
  store: Arc<S>,
}

impl<S> Clone for StatsCache<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S> StatsCache<S>
where
  S: EngagementStore + 'static,
{
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Re-derive the like and comment counts for `subject` in the background.
  ///
  /// The handle may be dropped; it is returned so callers that need the row
  /// to be written (tests, mostly) can await it.
  pub fn refresh_after_like(&self, subject: Subject) -> JoinHandle<()> {
    self.spawn_refresh(subject, None)
  }

  /// Refresh the row after a view, folding in the counter's new total.
  pub fn refresh_after_view(&self, subject: Subject, view_total: i64) -> JoinHandle<()> {
    self.spawn_refresh(subject, Some(view_total))
  }

  fn spawn_refresh(&self, subject: Subject, view_floor: Option<i64>) -> JoinHandle<()> {
    let store = self.store.clone();
    tokio::spawn(async move {
      if let Err(e) = refresh(store.as_ref(), &subject, view_floor).await {
        tracing::warn!(%subject, error = %e, "stats cache refresh failed");
      }
    })
  }

  /// The cached row for `subject`, or `None` if it was never written.
  pub async fn snapshot(&self, subject: &Subject) -> Result<Option<StatsSnapshot>> {
    self.store.get_snapshot(subject).await.map_err(Error::internal)
  }

  /// Cached rows for `subjects`, in request order. Subjects without a row
  /// get an all-zero snapshot.
  pub async fn snapshots(&self, subjects: &[Subject]) -> Result<Vec<StatsSnapshot>> {
    let found = self
      .store
      .get_snapshots(subjects)
      .await
      .map_err(Error::internal)?;

    Ok(
      subjects
        .iter()
        .map(|subject| {
          found
            .iter()
            .find(|s| &s.subject == subject)
            .cloned()
            .unwrap_or_else(|| StatsSnapshot::empty(subject.clone()))
        })
        .collect(),
    )
  }
}

async fn refresh<S: EngagementStore>(
  store: &S,
  subject: &Subject,
  view_floor: Option<i64>,
) -> Result<StatsSnapshot, S::Error> {
  let like_count    = store.count_likes(subject).await?;
  let comment_count = store.count_comments(subject).await?;

  store
    .upsert_snapshot(SnapshotUpdate {
      subject: subject.clone(),
      like_count,
      comment_count,
      view_floor,
      updated_at: Utc::now(),
    })
    .await
}
