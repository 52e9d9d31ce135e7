//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`EngagementStore`] and any
//! [`IdentityProvider`]. TLS, CORS and request tracing are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(state))
//! ```

pub mod caller;
pub mod comments;
pub mod error;
pub mod posts;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use serde::Deserialize;
use tally_core::{
  Engagement,
  resolve::{IdentityProvider, IdentityResolver},
  store::EngagementStore,
};

pub use error::ApiError;

// ─── Policy ───────────────────────────────────────────────────────────────────

/// How `POST /comments/:id/like` behaves. Post likes are always one-shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentLikeMode {
  /// A second like from the same identity is a no-op.
  #[default]
  Once,
  /// A second like from the same identity removes the first.
  Toggle,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, P> {
  pub store:         Arc<S>,
  pub engagement:    Engagement<S>,
  pub resolver:      IdentityResolver<P>,
  pub comment_likes: CommentLikeMode,
}

impl<S, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:         self.store.clone(),
      engagement:    self.engagement.clone(),
      resolver:      self.resolver.clone(),
      comment_likes: self.comment_likes,
    }
  }
}

impl<S, P> AppState<S, P>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  pub fn new(store: Arc<S>, provider: Arc<P>, comment_likes: CommentLikeMode) -> Self {
    Self {
      engagement: Engagement::new(store.clone()),
      resolver: IdentityResolver::new(provider),
      store,
      comment_likes,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(state: AppState<S, P>) -> Router<()>
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  Router::new()
    // Posts
    .route("/posts/stats", get(posts::batch_stats::<S, P>))
    .route("/posts/snapshots", get(posts::snapshots::<S, P>))
    .route("/posts/{id}/like", post(posts::like::<S, P>))
    .route("/posts/{id}/views", put(posts::view::<S, P>))
    .route("/posts/{id}/stats", get(posts::stats::<S, P>))
    // Comments; `{id}` is a post id here and a comment id under `/like`
    .route("/comments/{id}", get(comments::list::<S, P>).post(comments::create::<S, P>))
    .route("/comments/{id}/like", post(comments::like::<S, P>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
