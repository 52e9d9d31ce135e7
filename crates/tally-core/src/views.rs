//! `ViewCounter` — un-deduplicated view counts per post.
//!
//! Every call counts, including repeats from the same visitor. The counter
//! lives in the snapshot row; the store increments it with a single upsert.

use std::sync::Arc;

use crate::{Error, Result, cache::StatsCache, store::EngagementStore, subject::Subject};

pub struct ViewCounter<S> {
  store: Arc<S>,
  cache: StatsCache<S>,
}

impl<S> Clone for ViewCounter<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), cache: self.cache.clone() }
  }
}

impl<S> ViewCounter<S>
where
  S: EngagementStore + 'static,
{
  pub fn new(store: Arc<S>, cache: StatsCache<S>) -> Self { Self { store, cache } }

  /// Add one view to `post` and return the new total.
  pub async fn increment(&self, post: &Subject) -> Result<i64> {
    if !post.is_post() {
      return Err(Error::Validation(format!("views are only counted for posts, not {post}")));
    }

    let total = self
      .store
      .increment_views(post)
      .await
      .map_err(Error::internal)?;

    self.cache.refresh_after_view(post.clone(), total);
    Ok(total)
  }
}
