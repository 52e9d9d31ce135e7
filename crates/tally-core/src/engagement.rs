//! Like records, operation outcomes, and the two read models (live stats and
//! cached snapshots).
//!
//! Like and comment counts are authoritative only when counted live. The
//! [`StatsSnapshot`] is a denormalized mirror kept for bulk listings; its
//! view count is the one exception, since views have no other home.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{identity::Identity, subject::Subject};

// ─── Likes ───────────────────────────────────────────────────────────────────

/// Durable proof that `identity` liked `subject`.
/// At most one exists per `(subject, identity)` (enforced by a UNIQUE
/// constraint in the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRecord {
  pub subject:    Subject,
  pub identity:   Identity,
  pub created_at: DateTime<Utc>,
}

/// Result of an idempotent like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
  /// `false` when a record for the same identity already existed.
  pub created:     bool,
  pub total_likes: i64,
}

/// Result of a toggle: `liked` is the state after the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
  pub liked:       bool,
  pub total_likes: i64,
}

// ─── Live stats ──────────────────────────────────────────────────────────────

/// Aggregate counts for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
  pub likes:    i64,
  pub comments: i64,
  pub views:    i64,
}

/// Counts plus whether the requesting identity has liked the subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
  pub likes:    i64,
  pub comments: i64,
  pub views:    i64,
  pub is_liked: bool,
}

// ─── Cached snapshot ─────────────────────────────────────────────────────────

/// A denormalized, eventually-consistent row. Stale until the next mutation
/// on the same subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
  pub subject:       Subject,
  pub like_count:    i64,
  pub comment_count: i64,
  pub view_count:    i64,
  pub updated_at:    DateTime<Utc>,
}

impl StatsSnapshot {
  /// An all-zero snapshot, for subjects that have no row yet.
  pub fn empty(subject: Subject) -> Self {
    Self {
      subject,
      like_count: 0,
      comment_count: 0,
      view_count: 0,
      updated_at: DateTime::<Utc>::UNIX_EPOCH,
    }
  }
}

/// Input for [`EngagementStore::upsert_snapshot`](crate::store::EngagementStore::upsert_snapshot).
///
/// `view_floor` is merged with `max`, so a refresh carrying a stale view
/// total never lowers the stored count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotUpdate {
  pub subject:       Subject,
  pub like_count:    i64,
  pub comment_count: i64,
  pub view_floor:    Option<i64>,
  pub updated_at:    DateTime<Utc>,
}
