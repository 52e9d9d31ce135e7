//! HTTP server wiring for Tally.
//!
//! Mounts the [`tally_api`] router under `/api` and adds the outer layers the
//! API crate leaves to its host: CORS and request tracing.

pub mod auth;

use std::path::PathBuf;

use axum::{Router, http::HeaderValue};
use serde::Deserialize;
use tally_api::{AppState, CommentLikeMode};
use tally_core::{resolve::IdentityProvider, store::EngagementStore};
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TALLY_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// HS256 secret shared with whoever issues login tokens.
  pub jwt_secret:        String,
  #[serde(default)]
  pub comment_like_mode: CommentLikeMode,
  /// Empty, or containing `"*"`, allows any origin.
  #[serde(default)]
  pub allowed_origins:   Vec<String>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("tally.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application: the API under `/api`, wrapped in CORS and
/// tracing layers.
pub fn app<S, P>(state: AppState<S, P>, config: &ServerConfig) -> Router
where
  S: EngagementStore + 'static,
  P: IdentityProvider + 'static,
{
  Router::new()
    .nest("/api", tally_api::api_router(state))
    .layer(cors_layer(&config.allowed_origins))
    .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
  let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

  if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
    tracing::debug!("CORS: allowing any origin");
    return layer.allow_origin(Any);
  }

  let origins: Vec<HeaderValue> = allowed_origins
    .iter()
    .filter_map(|origin| match origin.parse() {
      Ok(value) => Some(value),
      Err(_) => {
        tracing::warn!(%origin, "CORS: ignoring malformed origin");
        None
      }
    })
    .collect();
  tracing::debug!(?allowed_origins, "CORS: restricted origins");
  layer.allow_origin(AllowOrigin::list(origins))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
