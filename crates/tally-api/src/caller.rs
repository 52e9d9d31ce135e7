//! Identity sources carried by a request: the bearer credential in the
//! `Authorization` header and the optional `anonymous_id` body field.

use std::convert::Infallible;

use axum::{
  body::Bytes,
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::ApiError;

/// The bearer credential, if the request carried one.
///
/// Never rejects: a missing or malformed header simply yields `None`, and
/// verification happens later in the identity resolver.
pub struct Bearer(pub Option<String>);

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S: Send + Sync> FromRequestParts<S> for Bearer {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(Bearer(bearer_token(&parts.headers).map(str::to_owned)))
  }
}

/// Body of the like endpoints: `{"anonymous_id": "..."}`. The body itself is
/// optional; an empty body means no anonymous token.
#[derive(Debug, Default, Deserialize)]
pub struct LikeBody {
  pub anonymous_id: Option<String>,
}

impl LikeBody {
  pub fn parse(body: &Bytes) -> Result<Self, ApiError> { parse_json_body(body) }
}

/// Parse a JSON request body regardless of `Content-Type`. A blank body
/// yields `T::default()`; malformed JSON is a [`ApiError::BadRequest`].
pub fn parse_json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(T::default());
  }
  serde_json::from_slice(body)
    .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}
