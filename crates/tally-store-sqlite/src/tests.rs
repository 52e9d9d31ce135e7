//! Integration tests for `SqliteStore` and the ledger components running on
//! top of it, against an in-memory database.

use std::sync::Arc;

use futures::future::join_all;
use tally_core::{
  Engagement, Error as CoreError,
  comment::{Comment, NewComment},
  engagement::{
    Counts, EngagementStats, LikeOutcome, LikeRecord, SnapshotUpdate, StatsSnapshot,
    ToggleOutcome,
  },
  identity::Identity,
  store::EngagementStore,
  subject::Subject,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn engagement() -> (Arc<SqliteStore>, Engagement<SqliteStore>) {
  let store = Arc::new(store().await);
  (store.clone(), Engagement::new(store))
}

fn anon(token: &str) -> Identity { Identity::Anonymous(token.into()) }

fn user(id: &str) -> Identity { Identity::Registered(id.into()) }

async fn comment_on(store: &SqliteStore, post_id: &str, content: &str) -> String {
  store
    .add_comment(NewComment {
      post_id: post_id.into(),
      user_id: "author".into(),
      content: content.into(),
    })
    .await
    .unwrap()
    .id
}

// ─── Likes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn like_twice_creates_one_record() {
  let (_, e) = engagement().await;
  let post = Subject::post("p1");

  let first = e.likes.try_like(&post, &anon("a")).await.unwrap();
  assert!(first.created);
  assert_eq!(first.total_likes, 1);

  let second = e.likes.try_like(&post, &anon("a")).await.unwrap();
  assert!(!second.created);
  assert_eq!(second.total_likes, first.total_likes);

  assert_eq!(e.likes.likes(&post).await.unwrap().len(), 1);
}

#[tokio::test]
async fn distinct_identities_each_count() {
  let (_, e) = engagement().await;
  let post = Subject::post("p1");
  let baseline = e.likes.count(&post).await.unwrap();

  e.likes.try_like(&post, &anon("a")).await.unwrap();
  e.likes.try_like(&post, &user("b")).await.unwrap();

  assert_eq!(e.likes.count(&post).await.unwrap(), baseline + 2);
}

#[tokio::test]
async fn registered_and_anonymous_with_same_value_are_distinct() {
  let (_, e) = engagement().await;
  let post = Subject::post("p1");

  let a = e.likes.try_like(&post, &user("u1")).await.unwrap();
  let b = e.likes.try_like(&post, &anon("u1")).await.unwrap();
  assert!(a.created && b.created);
  assert_eq!(b.total_likes, 2);

  let records = e.likes.likes(&post).await.unwrap();
  assert_eq!(records[0].identity, user("u1"));
  assert_eq!(records[1].identity, anon("u1"));
}

#[tokio::test]
async fn same_identity_on_different_subjects_is_independent() {
  let (_, e) = engagement().await;
  let id = anon("a");

  assert!(e.likes.try_like(&Subject::post("p1"), &id).await.unwrap().created);
  assert!(e.likes.try_like(&Subject::post("p2"), &id).await.unwrap().created);
  assert!(e.likes.exists(&Subject::post("p2"), &id).await.unwrap());
  assert!(!e.likes.exists(&Subject::post("p3"), &id).await.unwrap());
}

#[tokio::test]
async fn concurrent_identical_likes_store_exactly_one_record() {
  let (_, e) = engagement().await;
  let post = Subject::post("p1");
  let id = anon("racer");

  let outcomes = join_all((0..16).map(|_| e.likes.try_like(&post, &id))).await;
  let created = outcomes
    .iter()
    .filter(|o| o.as_ref().unwrap().created)
    .count();

  assert_eq!(created, 1);
  assert_eq!(e.likes.count(&post).await.unwrap(), 1);
}

#[tokio::test]
async fn comment_like_requires_existing_comment() {
  let (_, e) = engagement().await;
  let missing = Subject::comment("nope");

  let err = e.likes.try_like(&missing, &anon("a")).await.unwrap_err();
  assert!(matches!(err, CoreError::SubjectNotFound(s) if s == missing));
}

#[tokio::test]
async fn comment_like_is_one_shot() {
  let (store, e) = engagement().await;
  let comment = Subject::comment(comment_on(&store, "p1", "hello").await);

  assert!(e.likes.try_like(&comment, &anon("a")).await.unwrap().created);
  let again = e.likes.try_like(&comment, &anon("a")).await.unwrap();
  assert!(!again.created);
  assert_eq!(again.total_likes, 1);
}

#[tokio::test]
async fn toggle_twice_returns_to_original_count() {
  let (store, e) = engagement().await;
  let comment = Subject::comment(comment_on(&store, "p1", "hello").await);
  e.likes.try_like(&comment, &anon("other")).await.unwrap();

  let on = e.likes.toggle_like(&comment, &user("u1")).await.unwrap();
  assert!(on.liked);
  assert_eq!(on.total_likes, 2);

  let off = e.likes.toggle_like(&comment, &user("u1")).await.unwrap();
  assert!(!off.liked);
  assert_eq!(off.total_likes, 1);
  assert!(!e.likes.exists(&comment, &user("u1")).await.unwrap());
}

#[tokio::test]
async fn toggle_rejected_for_posts() {
  let (_, e) = engagement().await;
  let err = e
    .likes
    .toggle_like(&Subject::post("p1"), &anon("a"))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn toggle_missing_comment_is_not_found() {
  let (_, e) = engagement().await;
  let err = e
    .likes
    .toggle_like(&Subject::comment("ghost"), &anon("a"))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::SubjectNotFound(_)));
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn views_start_at_one_and_count_every_call() {
  let (_, e) = engagement().await;
  let post = Subject::post("p1");

  assert_eq!(e.views.increment(&post).await.unwrap(), 1);
  assert_eq!(e.views.increment(&post).await.unwrap(), 2);
  assert_eq!(e.views.increment(&post).await.unwrap(), 3);
}

#[tokio::test]
async fn concurrent_views_are_not_lost() {
  let (_, e) = engagement().await;
  let post = Subject::post("p1");
  e.views.increment(&post).await.unwrap();

  let results = join_all((0..25).map(|_| e.views.increment(&post))).await;
  assert!(results.iter().all(Result::is_ok));

  let stats = e.stats.compute_stats(&post, None).await.unwrap();
  assert_eq!(stats.views, 26);
}

#[tokio::test]
async fn views_on_comments_are_rejected() {
  let (_, e) = engagement().await;
  let err = e.views.increment(&Subject::comment("c1")).await.unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn zero_activity_subject_reads_as_zeros() {
  let (_, e) = engagement().await;
  let stats = e
    .stats
    .compute_stats(&Subject::post("untouched"), Some(&anon("a")))
    .await
    .unwrap();
  assert_eq!(stats, EngagementStats::default());
}

#[tokio::test]
async fn post_42_scenario() {
  let (_, e) = engagement().await;
  let post = Subject::post("post-42");

  let first = e.likes.try_like(&post, &anon("anon-1")).await.unwrap();
  assert!(first.created);
  assert_eq!(first.total_likes, 1);

  let repeat = e.likes.try_like(&post, &anon("anon-1")).await.unwrap();
  assert!(!repeat.created);
  assert_eq!(repeat.total_likes, 1);

  for _ in 0..3 {
    e.views.increment(&post).await.unwrap();
  }

  let liker = e.stats.compute_stats(&post, Some(&anon("anon-1"))).await.unwrap();
  assert_eq!(
    liker,
    EngagementStats { likes: 1, comments: 0, views: 3, is_liked: true }
  );

  let stranger = e.stats.compute_stats(&post, Some(&anon("anon-2"))).await.unwrap();
  assert_eq!(
    stranger,
    EngagementStats { likes: 1, comments: 0, views: 3, is_liked: false }
  );
}

#[tokio::test]
async fn stats_count_comments_on_posts() {
  let (store, e) = engagement().await;
  comment_on(&store, "p1", "first").await;
  comment_on(&store, "p1", "second").await;
  comment_on(&store, "p2", "elsewhere").await;

  let stats = e.stats.compute_stats(&Subject::post("p1"), None).await.unwrap();
  assert_eq!(stats.comments, 2);
  assert!(!stats.is_liked);
}

#[tokio::test]
async fn batch_stats_cover_every_requested_subject() {
  let (_, e) = engagement().await;
  e.likes.try_like(&Subject::post("a"), &anon("x")).await.unwrap();
  e.views.increment(&Subject::post("b")).await.unwrap();

  let subjects = [Subject::post("a"), Subject::post("b"), Subject::post("c")];
  let batch = e.stats.compute_stats_for_many(&subjects).await;

  assert_eq!(batch.len(), 3);
  assert_eq!(batch["a"], Counts { likes: 1, comments: 0, views: 0 });
  assert_eq!(batch["b"], Counts { likes: 0, comments: 0, views: 1 });
  assert_eq!(batch["c"], Counts::default());
}

// ─── Cache ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_after_like_writes_live_counts() {
  let (store, e) = engagement().await;
  let post = Subject::post("p1");
  comment_on(&store, "p1", "hi").await;
  store.insert_like(&post, &anon("a")).await.unwrap();

  e.cache.refresh_after_like(post.clone()).await.unwrap();

  let snap = e.cache.snapshot(&post).await.unwrap().unwrap();
  assert_eq!(snap.like_count, 1);
  assert_eq!(snap.comment_count, 1);
  assert_eq!(snap.view_count, 0);
}

#[tokio::test]
async fn refresh_after_like_preserves_views() {
  let (_, e) = engagement().await;
  let post = Subject::post("p1");
  e.views.increment(&post).await.unwrap();
  e.views.increment(&post).await.unwrap();

  e.likes.try_like(&post, &anon("a")).await.unwrap();
  e.cache.refresh_after_like(post.clone()).await.unwrap();

  let snap = e.cache.snapshot(&post).await.unwrap().unwrap();
  assert_eq!(snap.view_count, 2);
  assert_eq!(snap.like_count, 1);
}

#[tokio::test]
async fn stale_view_total_never_lowers_the_count() {
  let (store, e) = engagement().await;
  let post = Subject::post("p1");
  for _ in 0..5 {
    store.increment_views(&post).await.unwrap();
  }

  e.cache.refresh_after_view(post.clone(), 2).await.unwrap();

  let snap = e.cache.snapshot(&post).await.unwrap().unwrap();
  assert_eq!(snap.view_count, 5);
}

#[tokio::test]
async fn upsert_snapshot_creates_row_with_view_floor() {
  let s = store().await;
  let post = Subject::post("p1");

  let snap = s
    .upsert_snapshot(SnapshotUpdate {
      subject:       post.clone(),
      like_count:    4,
      comment_count: 1,
      view_floor:    Some(7),
      updated_at:    chrono::Utc::now(),
    })
    .await
    .unwrap();

  assert_eq!(snap.subject, post);
  assert_eq!((snap.like_count, snap.comment_count, snap.view_count), (4, 1, 7));
}

#[tokio::test]
async fn snapshots_fill_missing_rows_with_zeros() {
  let (_, e) = engagement().await;
  e.views.increment(&Subject::post("seen")).await.unwrap();

  let snaps = e
    .cache
    .snapshots(&[Subject::post("unseen"), Subject::post("seen")])
    .await
    .unwrap();

  assert_eq!(snaps[0].subject, Subject::post("unseen"));
  assert_eq!(snaps[0].view_count, 0);
  assert_eq!(snaps[1].subject, Subject::post("seen"));
  assert_eq!(snaps[1].view_count, 1);
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_comments_newest_first_with_live_likes() {
  let (store, e) = engagement().await;
  let older = comment_on(&store, "p1", "older").await;
  let newer = comment_on(&store, "p1", "newer").await;
  comment_on(&store, "p2", "other post").await;

  e.likes
    .try_like(&Subject::comment(older.clone()), &anon("a"))
    .await
    .unwrap();
  e.likes
    .try_like(&Subject::comment(older.clone()), &anon("b"))
    .await
    .unwrap();

  let comments = store.list_comments("p1").await.unwrap();
  assert_eq!(comments.len(), 2);
  assert_eq!(comments[0].id, newer);
  assert_eq!(comments[0].likes, 0);
  assert_eq!(comments[1].id, older);
  assert_eq!(comments[1].likes, 2);
}

#[tokio::test]
async fn comment_subjects_have_no_child_comments() {
  let s = store().await;
  let id = comment_on(&s, "p1", "x").await;
  assert_eq!(s.count_comments(&Subject::comment(id)).await.unwrap(), 0);
}

// ─── Failure paths ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum FailingError {
  #[error("injected failure")]
  Injected,
  #[error(transparent)]
  Store(#[from] crate::Error),
}

/// Delegates to a `SqliteStore`, except for the calls switched to fail.
#[derive(Default)]
struct Failures {
  count_likes_for: Option<&'static str>,
  like_exists:     bool,
  upsert_snapshot: bool,
}

struct FailingStore {
  inner: SqliteStore,
  fail:  Failures,
}

impl FailingStore {
  async fn new(fail: Failures) -> Arc<Self> {
    Arc::new(Self { inner: store().await, fail })
  }
}

impl EngagementStore for FailingStore {
  type Error = FailingError;

  async fn insert_like(
    &self,
    subject: &Subject,
    identity: &Identity,
  ) -> Result<LikeOutcome, FailingError> {
    Ok(self.inner.insert_like(subject, identity).await?)
  }

  async fn toggle_like(
    &self,
    subject: &Subject,
    identity: &Identity,
  ) -> Result<ToggleOutcome, FailingError> {
    Ok(self.inner.toggle_like(subject, identity).await?)
  }

  async fn like_exists(&self, subject: &Subject, identity: &Identity) -> Result<bool, FailingError> {
    if self.fail.like_exists {
      return Err(FailingError::Injected);
    }
    Ok(self.inner.like_exists(subject, identity).await?)
  }

  async fn count_likes(&self, subject: &Subject) -> Result<i64, FailingError> {
    if self.fail.count_likes_for.is_some_and(|id| id == subject.id) {
      return Err(FailingError::Injected);
    }
    Ok(self.inner.count_likes(subject).await?)
  }

  async fn list_likes(&self, subject: &Subject) -> Result<Vec<LikeRecord>, FailingError> {
    Ok(self.inner.list_likes(subject).await?)
  }

  async fn increment_views(&self, subject: &Subject) -> Result<i64, FailingError> {
    Ok(self.inner.increment_views(subject).await?)
  }

  async fn get_snapshot(&self, subject: &Subject) -> Result<Option<StatsSnapshot>, FailingError> {
    Ok(self.inner.get_snapshot(subject).await?)
  }

  async fn get_snapshots(&self, subjects: &[Subject]) -> Result<Vec<StatsSnapshot>, FailingError> {
    Ok(self.inner.get_snapshots(subjects).await?)
  }

  async fn upsert_snapshot(&self, update: SnapshotUpdate) -> Result<StatsSnapshot, FailingError> {
    if self.fail.upsert_snapshot {
      return Err(FailingError::Injected);
    }
    Ok(self.inner.upsert_snapshot(update).await?)
  }

  async fn comment_exists(&self, comment_id: &str) -> Result<bool, FailingError> {
    Ok(self.inner.comment_exists(comment_id).await?)
  }

  async fn count_comments(&self, subject: &Subject) -> Result<i64, FailingError> {
    Ok(self.inner.count_comments(subject).await?)
  }

  async fn add_comment(&self, input: NewComment) -> Result<Comment, FailingError> {
    Ok(self.inner.add_comment(input).await?)
  }

  async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, FailingError> {
    Ok(self.inner.list_comments(post_id).await?)
  }
}

#[tokio::test]
async fn failing_subject_reads_as_zeros_in_batch() {
  let store = FailingStore::new(Failures { count_likes_for: Some("bad"), ..Default::default() }).await;
  let e = Engagement::new(store.clone());
  for id in ["good", "bad"] {
    let post = Subject::post(id);
    e.likes.try_like(&post, &anon("a")).await.unwrap();
    e.views.increment(&post).await.unwrap();
  }

  let stats = e
    .stats
    .compute_stats_for_many(&[Subject::post("good"), Subject::post("bad")])
    .await;

  assert_eq!(stats["good"], Counts { likes: 1, comments: 0, views: 1 });
  assert_eq!(stats["bad"], Counts::default());
}

#[tokio::test]
async fn failing_like_lookup_reads_as_not_liked() {
  let store = FailingStore::new(Failures { like_exists: true, ..Default::default() }).await;
  let e = Engagement::new(store.clone());
  let post = Subject::post("p1");
  e.likes.try_like(&post, &anon("a")).await.unwrap();

  let stats = e.stats.compute_stats(&post, Some(&anon("a"))).await.unwrap();
  assert_eq!(stats.likes, 1);
  assert!(!stats.is_liked);
}

#[tokio::test]
async fn failing_cache_refresh_does_not_fail_the_write() {
  let store = FailingStore::new(Failures { upsert_snapshot: true, ..Default::default() }).await;
  let e = Engagement::new(store.clone());
  let post = Subject::post("p1");

  let outcome = e.likes.try_like(&post, &anon("a")).await.unwrap();
  assert!(outcome.created);
  assert_eq!(outcome.total_likes, 1);

  // The refresh task logs and finishes cleanly; it never panics.
  e.cache.refresh_after_like(post.clone()).await.unwrap();
  assert!(e.cache.snapshot(&post).await.unwrap().is_none());

  assert_eq!(e.views.increment(&post).await.unwrap(), 1);
  e.cache.refresh_after_view(post.clone(), 1).await.unwrap();

  let snap = e.cache.snapshot(&post).await.unwrap().unwrap();
  assert_eq!(snap.view_count, 1);
  assert_eq!(snap.like_count, 0);
}
