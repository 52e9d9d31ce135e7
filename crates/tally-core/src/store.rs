//! The `EngagementStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! The ledger components in this crate and the HTTP layer depend on this
//! abstraction, not on any concrete backend.
//!
//! Every mutating method must be atomic on its own: concurrency correctness
//! rests on the backend's uniqueness constraint and single-statement upserts,
//! never on locks held by callers.

use std::future::Future;

use crate::{
  comment::{Comment, NewComment},
  engagement::{LikeOutcome, LikeRecord, SnapshotUpdate, StatsSnapshot, ToggleOutcome},
  identity::Identity,
  subject::Subject,
};

/// Abstraction over the durable state behind the engagement ledger.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EngagementStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Likes ─────────────────────────────────────────────────────────────

  /// Insert a like record unless one exists for `(subject, identity)`, then
  /// count the subject's likes. A uniqueness conflict is reported as
  /// `created = false`, not as an error.
  fn insert_like<'a>(
    &'a self,
    subject: &'a Subject,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<LikeOutcome, Self::Error>> + Send + 'a;

  /// Delete the record if present, insert it otherwise, then count. Runs in
  /// a single transaction.
  fn toggle_like<'a>(
    &'a self,
    subject: &'a Subject,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<ToggleOutcome, Self::Error>> + Send + 'a;

  fn like_exists<'a>(
    &'a self,
    subject: &'a Subject,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Live count of like records for `subject`.
  fn count_likes<'a>(
    &'a self,
    subject: &'a Subject,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// All like records for `subject`, oldest first.
  fn list_likes<'a>(
    &'a self,
    subject: &'a Subject,
  ) -> impl Future<Output = Result<Vec<LikeRecord>, Self::Error>> + Send + 'a;

  // ── Views ─────────────────────────────────────────────────────────────

  /// Atomically add one view and return the new total. Creates the counter
  /// at 1 when absent.
  fn increment_views<'a>(
    &'a self,
    subject: &'a Subject,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  // ── Snapshots ─────────────────────────────────────────────────────────

  /// Retrieve the cached row for `subject`. Returns `None` if never written.
  fn get_snapshot<'a>(
    &'a self,
    subject: &'a Subject,
  ) -> impl Future<Output = Result<Option<StatsSnapshot>, Self::Error>> + Send + 'a;

  /// Retrieve cached rows for many subjects; subjects without a row are
  /// omitted.
  fn get_snapshots<'a>(
    &'a self,
    subjects: &'a [Subject],
  ) -> impl Future<Output = Result<Vec<StatsSnapshot>, Self::Error>> + Send + 'a;

  /// Upsert the cached row and return it as stored. Never lowers the view
  /// count (see [`SnapshotUpdate::view_floor`]).
  fn upsert_snapshot(
    &self,
    update: SnapshotUpdate,
  ) -> impl Future<Output = Result<StatsSnapshot, Self::Error>> + Send + '_;

  // ── Content ───────────────────────────────────────────────────────────

  fn comment_exists<'a>(
    &'a self,
    comment_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Live count of comments whose parent is `subject`.
  fn count_comments<'a>(
    &'a self,
    subject: &'a Subject,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Persist a comment. The id and `created_at` are assigned by the store.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on a post, newest first, each with its live like count.
  fn list_comments<'a>(
    &'a self,
    post_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + 'a;
}
