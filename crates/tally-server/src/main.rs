//! tally-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `TALLY_*` environment variables, opens the SQLite store, and serves the
//! engagement API over HTTP.
//!
//! # Issuing a test token
//!
//! ```
//! cargo run -p tally-server -- --issue-token alice
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::TimeDelta;
use clap::Parser;
use tally_api::AppState;
use tally_server::{ServerConfig, auth::JwtIdentityProvider};
use tally_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally engagement server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a signed bearer token for USER_ID and exit.
  #[arg(long, value_name = "USER_ID")]
  issue_token: Option<String>,

  /// Lifetime of a token printed by `--issue-token`, in hours.
  #[arg(long, default_value_t = 24)]
  token_ttl_hours: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("TALLY")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("allowed_origins"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let jwt = Arc::new(JwtIdentityProvider::new(&server_cfg.jwt_secret));

  // Helper mode: sign a token and exit.
  if let Some(user_id) = cli.issue_token {
    let ttl = TimeDelta::try_hours(cli.token_ttl_hours)
      .with_context(|| format!("--token-ttl-hours {} is out of range", cli.token_ttl_hours))?;
    let token = jwt.issue(&user_id, ttl).context("failed to sign token")?;
    println!("{token}");
    return Ok(());
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState::new(Arc::new(store), jwt, server_cfg.comment_like_mode);
  let app = tally_server::app(state, &server_cfg);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    comment_like_mode = ?server_cfg.comment_like_mode,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
