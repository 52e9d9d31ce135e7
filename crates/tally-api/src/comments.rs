//! Handlers for `/comments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/comments/:post_id` | Newest first, each with its live like count |
//! | `POST` | `/comments/:post_id` | Bearer required; body: `{"content":"..."}` |
//! | `POST` | `/comments/:comment_id/like` | Bearer or `{"anonymous_id":"..."}`; 404 if absent |

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tally_core::{
  comment::{Comment, NewComment},
  identity::Identity,
  resolve::IdentityProvider,
  store::EngagementStore,
  subject::Subject,
};

use crate::{
  AppState, CommentLikeMode,
  caller::{Bearer, LikeBody, parse_json_body},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /comments/:post_id`
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
  Path(post_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  let comments = state
    .store
    .list_comments(&post_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(comments))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
  pub comment: Comment,
}

/// `POST /comments/:post_id` — body: `{"content":"..."}`
///
/// Only registered users may comment; an anonymous token is not enough.
pub async fn create<S, P>(
  State(state): State<AppState<S, P>>,
  Path(post_id): Path<String>,
  Bearer(token): Bearer,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  let user_id = match state.resolver.try_resolve(token.as_deref(), None).await {
    Some(Identity::Registered(user_id)) => user_id,
    Some(Identity::Anonymous(_)) | None => {
      return Err(ApiError::Unauthorized("a valid bearer token is required".into()));
    }
  };

  let body: CreateBody = parse_json_body(&body)?;
  let content = body.content.trim();
  if content.is_empty() {
    return Err(ApiError::BadRequest("comment content is required".into()));
  }

  let comment = state
    .store
    .add_comment(NewComment { post_id, user_id, content: content.to_owned() })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok((StatusCode::CREATED, Json(CreateResponse { comment })))
}

// ─── Like ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
  pub likes:    i64,
  /// Only reported in toggle mode, where a like can be undone.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_liked: Option<bool>,
}

/// `POST /comments/:comment_id/like` — body: `{"anonymous_id":"..."}`
///
/// One-shot or toggle depending on [`CommentLikeMode`]; the mode applies to
/// every comment-like request.
pub async fn like<S, P>(
  State(state): State<AppState<S, P>>,
  Path(comment_id): Path<String>,
  Bearer(token): Bearer,
  body: Bytes,
) -> Result<Json<LikeResponse>, ApiError>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  let body = LikeBody::parse(&body)?;
  let identity = state
    .resolver
    .resolve(token.as_deref(), body.anonymous_id.as_deref())
    .await?;
  let subject = Subject::comment(comment_id);

  let response = match state.comment_likes {
    CommentLikeMode::Once => {
      let outcome = state.engagement.likes.try_like(&subject, &identity).await?;
      LikeResponse { likes: outcome.total_likes, is_liked: None }
    }
    CommentLikeMode::Toggle => {
      let outcome = state.engagement.likes.toggle_like(&subject, &identity).await?;
      LikeResponse { likes: outcome.total_likes, is_liked: Some(outcome.liked) }
    }
  };
  Ok(Json(response))
}
