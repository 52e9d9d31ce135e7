//! Error types for `tally-core`.

use thiserror::Error;

use crate::subject::Subject;

#[derive(Debug, Error)]
pub enum Error {
  #[error("either a bearer token or an anonymous_id is required")]
  IdentityRequired,

  #[error("subject not found: {0}")]
  SubjectNotFound(Subject),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("storage error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error. Storage failures are never retried here.
  pub fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
