//! [`Engagement`] — the ledger components wired to one shared store.

use std::sync::Arc;

use crate::{
  aggregate::StatsAggregator, cache::StatsCache, ledger::LikeLedger,
  store::EngagementStore, views::ViewCounter,
};

/// Bundles the components that mutate or read engagement state. All of them
/// share the same store handle, and the mutating ones share one cache.
pub struct Engagement<S> {
  pub likes: LikeLedger<S>,
  pub views: ViewCounter<S>,
  pub stats: StatsAggregator<S>,
  pub cache: StatsCache<S>,
}

impl<S> Clone for Engagement<S> {
  fn clone(&self) -> Self {
    Self {
      likes: self.likes.clone(),
      views: self.views.clone(),
      stats: self.stats.clone(),
      cache: self.cache.clone(),
    }
  }
}

impl<S> Engagement<S>
where
  S: EngagementStore + 'static,
{
  pub fn new(store: Arc<S>) -> Self {
    let cache = StatsCache::new(store.clone());
    Self {
      likes: LikeLedger::new(store.clone(), cache.clone()),
      views: ViewCounter::new(store.clone(), cache.clone()),
      stats: StatsAggregator::new(store),
      cache,
    }
  }
}
