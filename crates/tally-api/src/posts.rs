//! Handlers for `/posts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/posts/:id/like` | Bearer or `{"anonymous_id":"..."}`; one-shot |
//! | `PUT`  | `/posts/:id/views` | No identity; every call counts |
//! | `GET`  | `/posts/:id/stats` | Optional bearer or `?anonymous_id=` for `isLiked` |
//! | `GET`  | `/posts/stats` | `?postIds=a,b,c`; live counts per post |
//! | `GET`  | `/posts/snapshots` | `?postIds=a,b,c`; cached rows per post |

use std::collections::BTreeMap;

use axum::{
  Json,
  body::Bytes,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{
  engagement::{Counts, EngagementStats},
  resolve::IdentityProvider,
  store::EngagementStore,
  subject::Subject,
};

use crate::{
  AppState,
  caller::{Bearer, LikeBody},
  error::ApiError,
};

// ─── Like ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
  pub likes:    i64,
  pub is_liked: bool,
}

/// `POST /posts/:id/like` — body: `{"anonymous_id":"..."}` (optional with a
/// valid bearer token)
pub async fn like<S, P>(
  State(state): State<AppState<S, P>>,
  Path(id): Path<String>,
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

  let outcome = state
    .engagement
    .likes
    .try_like(&Subject::post(id), &identity)
    .await?;

  Ok(Json(LikeResponse { likes: outcome.total_likes, is_liked: true }))
}

// ─── Views ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
  pub views: i64,
}

/// `PUT /posts/:id/views`
pub async fn view<S, P>(
  State(state): State<AppState<S, P>>,
  Path(id): Path<String>,
) -> Result<Json<ViewsResponse>, ApiError>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  let views = state.engagement.views.increment(&Subject::post(id)).await?;
  Ok(Json(ViewsResponse { views }))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatsParams {
  pub anonymous_id: Option<String>,
}

/// `GET /posts/:id/stats[?anonymous_id=...]`
///
/// Never requires an identity; without one `isLiked` is `false`.
pub async fn stats<S, P>(
  State(state): State<AppState<S, P>>,
  Path(id): Path<String>,
  Bearer(token): Bearer,
  Query(params): Query<StatsParams>,
) -> Result<Json<EngagementStats>, ApiError>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  let identity = state
    .resolver
    .try_resolve(token.as_deref(), params.anonymous_id.as_deref())
    .await;

  let stats = state
    .engagement
    .stats
    .compute_stats(&Subject::post(id), identity.as_ref())
    .await?;
  Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct BatchParams {
  /// Comma-separated post ids.
  #[serde(rename = "postIds")]
  pub post_ids: Option<String>,
}

impl BatchParams {
  fn subjects(&self) -> Result<Vec<Subject>, ApiError> {
    let subjects: Vec<Subject> = self
      .post_ids
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|id| !id.is_empty())
      .map(Subject::post)
      .collect();

    if subjects.is_empty() {
      return Err(ApiError::BadRequest("postIds parameter is required".into()));
    }
    Ok(subjects)
  }
}

/// `GET /posts/stats?postIds=a,b,c` — live counts keyed by post id
pub async fn batch_stats<S, P>(
  State(state): State<AppState<S, P>>,
  Query(params): Query<BatchParams>,
) -> Result<Json<BTreeMap<String, Counts>>, ApiError>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  let subjects = params.subjects()?;
  let stats = state.engagement.stats.compute_stats_for_many(&subjects).await;
  Ok(Json(stats))
}

// ─── Snapshots ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
  pub likes:      i64,
  pub comments:   i64,
  pub views:      i64,
  pub updated_at: DateTime<Utc>,
}

/// `GET /posts/snapshots?postIds=a,b,c` — cached rows keyed by post id
///
/// Cheaper than `/posts/stats` but may lag behind the latest likes.
pub async fn snapshots<S, P>(
  State(state): State<AppState<S, P>>,
  Query(params): Query<BatchParams>,
) -> Result<Json<BTreeMap<String, SnapshotView>>, ApiError>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  let subjects = params.subjects()?;
  let rows = state.engagement.cache.snapshots(&subjects).await?;

  Ok(Json(
    rows
      .into_iter()
      .map(|s| {
        (s.subject.id, SnapshotView {
          likes:      s.like_count,
          comments:   s.comment_count,
          views:      s.view_count,
          updated_at: s.updated_at,
        })
      })
      .collect(),
  ))
}
