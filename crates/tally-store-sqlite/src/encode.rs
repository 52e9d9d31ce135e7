//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond precision
//! so that lexical order matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use tally_core::{
  comment::Comment,
  engagement::{LikeRecord, StatsSnapshot},
  identity::{Identity, IdentityKind},
  subject::{Subject, SubjectKind},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Kinds ───────────────────────────────────────────────────────────────────

pub fn encode_subject_kind(k: SubjectKind) -> &'static str {
  match k {
    SubjectKind::Post => "post",
    SubjectKind::Comment => "comment",
  }
}

pub fn decode_subject_kind(s: &str) -> Result<SubjectKind> {
  s.parse().map_err(|_| Error::UnknownKind {
    column: "subject_kind",
    value:  s.to_owned(),
  })
}

pub fn encode_identity_kind(k: IdentityKind) -> &'static str {
  match k {
    IdentityKind::Registered => "registered",
    IdentityKind::Anonymous => "anonymous",
  }
}

pub fn decode_identity_kind(s: &str) -> Result<IdentityKind> {
  s.parse().map_err(|_| Error::UnknownKind {
    column: "identity_kind",
    value:  s.to_owned(),
  })
}

/// Owned column values for a `(subject, identity)` pair, ready to move into a
/// `Connection::call` closure.
pub struct LikeKey {
  pub subject_kind:   &'static str,
  pub subject_id:     String,
  pub identity_kind:  &'static str,
  pub identity_value: String,
}

impl LikeKey {
  pub fn new(subject: &Subject, identity: &Identity) -> Self {
    Self {
      subject_kind:   encode_subject_kind(subject.kind),
      subject_id:     subject.id.clone(),
      identity_kind:  encode_identity_kind(identity.kind()),
      identity_value: identity.value().to_owned(),
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `likes` row.
pub struct RawLike {
  pub subject_kind:   String,
  pub subject_id:     String,
  pub identity_kind:  String,
  pub identity_value: String,
  pub created_at:     String,
}

impl RawLike {
  pub fn into_record(self) -> Result<LikeRecord> {
    Ok(LikeRecord {
      subject:    Subject::new(decode_subject_kind(&self.subject_kind)?, self.subject_id),
      identity:   Identity::from_parts(
        decode_identity_kind(&self.identity_kind)?,
        self.identity_value,
      ),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `stats_snapshots` row.
pub struct RawSnapshot {
  pub subject_kind:  String,
  pub subject_id:    String,
  pub like_count:    i64,
  pub comment_count: i64,
  pub view_count:    i64,
  pub updated_at:    String,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<StatsSnapshot> {
    Ok(StatsSnapshot {
      subject:       Subject::new(decode_subject_kind(&self.subject_kind)?, self.subject_id),
      like_count:    self.like_count,
      comment_count: self.comment_count,
      view_count:    self.view_count,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `comments` row plus its live like count.
pub struct RawComment {
  pub comment_id: String,
  pub post_id:    String,
  pub user_id:    String,
  pub content:    String,
  pub created_at: String,
  pub likes:      i64,
}

impl RawComment {
  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:         self.comment_id,
      post_id:    self.post_id,
      user_id:    self.user_id,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
      likes:      self.likes,
    })
  }
}
