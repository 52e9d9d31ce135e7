//! Identity — the resolved actor behind a request.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Who is performing an action.
///
/// Exactly one variant is ever populated. `Registered("u1")` and
/// `Anonymous("u1")` are different identities: deduplication keys on the
/// variant as well as the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Identity {
  /// A user id vouched for by the identity provider.
  Registered(String),
  /// An opaque client-generated token.
  Anonymous(String),
}

/// Discriminant of [`Identity`], as stored alongside a like record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum IdentityKind {
  Registered,
  Anonymous,
}

impl Identity {
  pub fn kind(&self) -> IdentityKind {
    match self {
      Self::Registered(_) => IdentityKind::Registered,
      Self::Anonymous(_) => IdentityKind::Anonymous,
    }
  }

  pub fn value(&self) -> &str {
    match self {
      Self::Registered(v) | Self::Anonymous(v) => v,
    }
  }

  pub fn from_parts(kind: IdentityKind, value: String) -> Self {
    match kind {
      IdentityKind::Registered => Self::Registered(value),
      IdentityKind::Anonymous => Self::Anonymous(value),
    }
  }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.kind().as_ref(), self.value())
  }
}
