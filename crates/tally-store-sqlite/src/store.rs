//! [`SqliteStore`] — the SQLite implementation of [`EngagementStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use tally_core::{
  comment::{Comment, NewComment},
  engagement::{LikeOutcome, LikeRecord, SnapshotUpdate, StatsSnapshot, ToggleOutcome},
  identity::Identity,
  store::EngagementStore,
  subject::{Subject, SubjectKind},
};

use crate::{
  Error, Result,
  encode::{
    LikeKey, RawComment, RawLike, RawSnapshot, encode_dt, encode_subject_kind,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An engagement store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────

const INSERT_LIKE: &str = "
  INSERT INTO likes (subject_kind, subject_id, identity_kind, identity_value, created_at)
  VALUES (?1, ?2, ?3, ?4, ?5)
  ON CONFLICT DO NOTHING";

const SNAPSHOT_COLUMNS: &str =
  "subject_kind, subject_id, like_count, comment_count, view_count, updated_at";

fn count_likes_on(
  conn: &rusqlite::Connection,
  subject_kind: &str,
  subject_id: &str,
) -> rusqlite::Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM likes WHERE subject_kind = ?1 AND subject_id = ?2",
    rusqlite::params![subject_kind, subject_id],
    |r| r.get(0),
  )
}

fn raw_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSnapshot> {
  Ok(RawSnapshot {
    subject_kind:  row.get(0)?,
    subject_id:    row.get(1)?,
    like_count:    row.get(2)?,
    comment_count: row.get(3)?,
    view_count:    row.get(4)?,
    updated_at:    row.get(5)?,
  })
}

// ─── EngagementStore impl ────────────────────────────────────────────────────

impl EngagementStore for SqliteStore {
  type Error = Error;

  // ── Likes ─────────────────────────────────────────────────────────────────

  async fn insert_like(&self, subject: &Subject, identity: &Identity) -> Result<LikeOutcome> {
    let key    = LikeKey::new(subject, identity);
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          INSERT_LIKE,
          rusqlite::params![
            key.subject_kind,
            key.subject_id,
            key.identity_kind,
            key.identity_value,
            at_str,
          ],
        )?;
        let total_likes = count_likes_on(conn, key.subject_kind, &key.subject_id)?;
        Ok(LikeOutcome { created: inserted == 1, total_likes })
      })
      .await?;

    Ok(outcome)
  }

  async fn toggle_like(&self, subject: &Subject, identity: &Identity) -> Result<ToggleOutcome> {
    let key    = LikeKey::new(subject, identity);
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx.execute(
          "DELETE FROM likes
           WHERE subject_kind = ?1 AND subject_id = ?2
             AND identity_kind = ?3 AND identity_value = ?4",
          rusqlite::params![
            key.subject_kind,
            key.subject_id,
            key.identity_kind,
            key.identity_value,
          ],
        )?;
        if removed == 0 {
          tx.execute(
            INSERT_LIKE,
            rusqlite::params![
              key.subject_kind,
              key.subject_id,
              key.identity_kind,
              key.identity_value,
              at_str,
            ],
          )?;
        }
        let total_likes = count_likes_on(&tx, key.subject_kind, &key.subject_id)?;
        tx.commit()?;
        Ok(ToggleOutcome { liked: removed == 0, total_likes })
      })
      .await?;

    Ok(outcome)
  }

  async fn like_exists(&self, subject: &Subject, identity: &Identity) -> Result<bool> {
    let key = LikeKey::new(subject, identity);

    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM likes
               WHERE subject_kind = ?1 AND subject_id = ?2
                 AND identity_kind = ?3 AND identity_value = ?4",
              rusqlite::params![
                key.subject_kind,
                key.subject_id,
                key.identity_kind,
                key.identity_value,
              ],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(exists)
  }

  async fn count_likes(&self, subject: &Subject) -> Result<i64> {
    let kind_str = encode_subject_kind(subject.kind);
    let id_str   = subject.id.clone();

    let count = self
      .conn
      .call(move |conn| Ok(count_likes_on(conn, kind_str, &id_str)?))
      .await?;

    Ok(count)
  }

  async fn list_likes(&self, subject: &Subject) -> Result<Vec<LikeRecord>> {
    let kind_str = encode_subject_kind(subject.kind);
    let id_str   = subject.id.clone();

    let raws: Vec<RawLike> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_kind, subject_id, identity_kind, identity_value, created_at
           FROM likes
           WHERE subject_kind = ?1 AND subject_id = ?2
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![kind_str, id_str], |row| {
            Ok(RawLike {
              subject_kind:   row.get(0)?,
              subject_id:     row.get(1)?,
              identity_kind:  row.get(2)?,
              identity_value: row.get(3)?,
              created_at:     row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLike::into_record).collect()
  }

  // ── Views ─────────────────────────────────────────────────────────────────

  async fn increment_views(&self, subject: &Subject) -> Result<i64> {
    let kind_str = encode_subject_kind(subject.kind);
    let id_str   = subject.id.clone();
    let at_str   = encode_dt(Utc::now());

    let total = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO stats_snapshots (subject_kind, subject_id, view_count, updated_at)
           VALUES (?1, ?2, 1, ?3)
           ON CONFLICT (subject_kind, subject_id) DO UPDATE SET
             view_count = view_count + 1,
             updated_at = excluded.updated_at
           RETURNING view_count",
          rusqlite::params![kind_str, id_str, at_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(total)
  }

  // ── Snapshots ─────────────────────────────────────────────────────────────

  async fn get_snapshot(&self, subject: &Subject) -> Result<Option<StatsSnapshot>> {
    let kind_str = encode_subject_kind(subject.kind);
    let id_str   = subject.id.clone();

    let raw: Option<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SNAPSHOT_COLUMNS} FROM stats_snapshots
                 WHERE subject_kind = ?1 AND subject_id = ?2"
              ),
              rusqlite::params![kind_str, id_str],
              raw_snapshot,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }

  async fn get_snapshots(&self, subjects: &[Subject]) -> Result<Vec<StatsSnapshot>> {
    let keys: Vec<(&'static str, String)> = subjects
      .iter()
      .map(|s| (encode_subject_kind(s.kind), s.id.clone()))
      .collect();

    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SNAPSHOT_COLUMNS} FROM stats_snapshots
           WHERE subject_kind = ?1 AND subject_id = ?2"
        ))?;
        let mut rows = Vec::with_capacity(keys.len());
        for (kind_str, id_str) in keys {
          if let Some(raw) = stmt
            .query_row(rusqlite::params![kind_str, id_str], raw_snapshot)
            .optional()?
          {
            rows.push(raw);
          }
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSnapshot::into_snapshot).collect()
  }

  async fn upsert_snapshot(&self, update: SnapshotUpdate) -> Result<StatsSnapshot> {
    let kind_str = encode_subject_kind(update.subject.kind);
    let id_str   = update.subject.id;
    let at_str   = encode_dt(update.updated_at);

    let raw: RawSnapshot = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO stats_snapshots
               (subject_kind, subject_id, like_count, comment_count, view_count, updated_at)
             VALUES (?1, ?2, ?3, ?4, COALESCE(?5, 0), ?6)
             ON CONFLICT (subject_kind, subject_id) DO UPDATE SET
               like_count    = excluded.like_count,
               comment_count = excluded.comment_count,
               view_count    = MAX(view_count, excluded.view_count),
               updated_at    = excluded.updated_at
             RETURNING {SNAPSHOT_COLUMNS}"
          ),
          rusqlite::params![
            kind_str,
            id_str,
            update.like_count,
            update.comment_count,
            update.view_floor,
            at_str,
          ],
          raw_snapshot,
        )?)
      })
      .await?;

    raw.into_snapshot()
  }

  // ── Content ───────────────────────────────────────────────────────────────

  async fn comment_exists(&self, comment_id: &str) -> Result<bool> {
    let id_str = comment_id.to_owned();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM comments WHERE comment_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(exists)
  }

  async fn count_comments(&self, subject: &Subject) -> Result<i64> {
    // Comments only hang off posts; there are no nested replies.
    if subject.kind == SubjectKind::Comment {
      return Ok(0);
    }
    let post_id = subject.id.clone();

    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
          rusqlite::params![post_id],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count)
  }

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = Comment {
      id:         Uuid::new_v4().hyphenated().to_string(),
      post_id:    input.post_id,
      user_id:    input.user_id,
      content:    input.content,
      created_at: Utc::now(),
      likes:      0,
    };

    let id_str      = comment.id.clone();
    let post_id     = comment.post_id.clone();
    let user_id     = comment.user_id.clone();
    let content     = comment.content.clone();
    let created_str = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, post_id, user_id, content, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, post_id, user_id, content, created_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
    let post_id = post_id.to_owned();
    let kind_str = encode_subject_kind(SubjectKind::Comment);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.comment_id, c.post_id, c.user_id, c.content, c.created_at,
                  (SELECT COUNT(*) FROM likes l
                    WHERE l.subject_kind = ?2 AND l.subject_id = c.comment_id) AS likes
           FROM comments c
           WHERE c.post_id = ?1
           ORDER BY c.created_at DESC, c.rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![post_id, kind_str], |row| {
            Ok(RawComment {
              comment_id: row.get(0)?,
              post_id:    row.get(1)?,
              user_id:    row.get(2)?,
              content:    row.get(3)?,
              created_at: row.get(4)?,
              likes:      row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}
