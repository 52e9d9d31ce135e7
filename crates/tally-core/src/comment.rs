//! Comment records owned by the content store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored comment. `likes` is counted live when the comment is listed.
///
/// Serialized with snake_case keys, the shape comment clients already read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         String,
  pub post_id:    String,
  pub user_id:    String,
  pub content:    String,
  pub created_at: DateTime<Utc>,
  pub likes:      i64,
}

/// Input for [`EngagementStore::add_comment`](crate::store::EngagementStore::add_comment).
#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id: String,
  pub user_id: String,
  pub content: String,
}
