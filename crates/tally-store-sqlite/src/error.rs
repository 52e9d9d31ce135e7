//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A kind column held a value no enum variant matches.
  #[error("unknown {column} value: {value:?}")]
  UnknownKind { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
