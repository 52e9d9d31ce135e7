//! Subject — the post or comment being engaged with.
//!
//! Subjects are never created explicitly. They come into existence the first
//! time someone likes or views them and are never deleted.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// The kind of content a subject refers to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
  AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubjectKind {
  Post,
  Comment,
}

/// A reference to a post or comment. The id is opaque to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Subject {
  pub kind: SubjectKind,
  pub id:   String,
}

impl Subject {
  pub fn new(kind: SubjectKind, id: impl Into<String>) -> Self {
    Self { kind, id: id.into() }
  }

  pub fn post(id: impl Into<String>) -> Self { Self::new(SubjectKind::Post, id) }

  pub fn comment(id: impl Into<String>) -> Self { Self::new(SubjectKind::Comment, id) }

  pub fn is_post(&self) -> bool { self.kind == SubjectKind::Post }
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.kind.as_ref(), self.id)
  }
}
