//! Bearer-token verification with HS256 JWTs.
//!
//! The `sub` claim carries the registered user id. Expiry is always enforced.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use tally_core::resolve::IdentityProvider;

pub use jsonwebtoken::errors::Error;

/// Failure to sign a token.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
  #[error("token lifetime of {0} is out of range")]
  TtlOutOfRange(TimeDelta),

  #[error(transparent)]
  Sign(#[from] Error),
}

/// Claims carried by a Tally bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// Registered user id.
  pub sub: String,
  /// Issued at (Unix seconds).
  pub iat: i64,
  /// Expiration (Unix seconds).
  pub exp: i64,
}

/// Verifies (and, for the `--issue-token` helper, signs) HS256 tokens with a
/// shared secret.
pub struct JwtIdentityProvider {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl JwtIdentityProvider {
  pub fn new(secret: &str) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation,
    }
  }

  /// Sign a token for `user_id` that expires after `ttl`.
  pub fn issue(&self, user_id: &str, ttl: TimeDelta) -> Result<String, IssueError> {
    let now = Utc::now();
    let expires = now
      .checked_add_signed(ttl)
      .ok_or(IssueError::TtlOutOfRange(ttl))?;
    let claims = Claims {
      sub: user_id.to_owned(),
      iat: now.timestamp(),
      exp: expires.timestamp(),
    };
    Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
  }

  /// Validate `token` and return its claims.
  pub fn claims(&self, token: &str) -> Result<Claims, Error> {
    decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
  }
}

impl IdentityProvider for JwtIdentityProvider {
  type Error = Error;

  async fn verify(&self, credential: &str) -> Result<String, Error> {
    self.claims(credential).map(|c| c.sub)
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn issued_token_verifies() {
    let jwt = JwtIdentityProvider::new("s3cret");
    let token = jwt.issue("user-7", TimeDelta::hours(1)).unwrap();
    assert_eq!(jwt.verify(&token).await.unwrap(), "user-7");
  }

  #[tokio::test]
  async fn wrong_secret_rejected() {
    let token = JwtIdentityProvider::new("one")
      .issue("user-7", TimeDelta::hours(1))
      .unwrap();
    assert!(JwtIdentityProvider::new("two").verify(&token).await.is_err());
  }

  #[tokio::test]
  async fn expired_token_rejected() {
    let jwt = JwtIdentityProvider::new("s3cret");
    // Well past the default leeway.
    let token = jwt.issue("user-7", TimeDelta::hours(-2)).unwrap();
    assert!(jwt.verify(&token).await.is_err());
  }

  #[test]
  fn out_of_range_ttl_is_an_error() {
    let jwt = JwtIdentityProvider::new("s3cret");
    assert!(matches!(
      jwt.issue("user-7", TimeDelta::MAX),
      Err(IssueError::TtlOutOfRange(_))
    ));
  }

  #[tokio::test]
  async fn garbage_rejected() {
    let jwt = JwtIdentityProvider::new("s3cret");
    assert!(jwt.verify("not.a.jwt").await.is_err());
    assert!(jwt.verify("").await.is_err());
  }
}
