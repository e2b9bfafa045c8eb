//! # SQLite stores
//!
//! Implements the comment, newsletter and account ports on a single SQLite
//! database, so comment authorship survives a restart.
//! Ids are stored as 16-byte BLOBs; `seq` breaks ties between equal timestamps.

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Account, AccountStore, Comment, CommentId, CommentStore, DomainError, Identity, NewComment,
    NewsletterStore, Result, SignupOutcome, UserId,
};
use parking_lot::Mutex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::clock::MonotonicClock;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS comments (
        seq            INTEGER PRIMARY KEY AUTOINCREMENT,
        id             BLOB    NOT NULL UNIQUE,
        content        TEXT    NOT NULL,
        author_id      BLOB    NOT NULL,
        author_display TEXT    NOT NULL,
        article_key    TEXT    NOT NULL,
        parent_id      BLOB,
        created_at     TEXT    NOT NULL,
        is_deleted     INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS comments_by_article ON comments (article_key, created_at, seq)",
    "CREATE TABLE IF NOT EXISTS newsletter_subscribers (
        email         TEXT PRIMARY KEY,
        subscribed_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS accounts (
        id            BLOB PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        display_label TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at    TEXT NOT NULL
    )",
];

pub struct SqliteStore {
    pool: SqlitePool,
    clock: Mutex<MonotonicClock>,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Result<Uuid> {
    Uuid::from_slice(blob).map_err(|e| DomainError::unavailable(format!("corrupt id column: {e}")))
}

fn unavailable(err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "sqlite query failed");
    DomainError::unavailable(err)
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies the schema.
    ///
    /// In-memory databases live as long as their single connection, so the
    /// pool is pinned to one connection that never idles out.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parsing sqlite url {url:?}"))?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };
        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("opening sqlite database {url:?}"))?;

        let store = Self { pool, clock: Mutex::new(MonotonicClock::default()) };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("applying sqlite schema")?;
        }
        Ok(())
    }
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
    let parent: Option<Vec<u8>> = row.try_get("parent_id").map_err(unavailable)?;
    Ok(Comment {
        id: CommentId(blob_to_uuid(&row.try_get::<Vec<u8>, _>("id").map_err(unavailable)?)?),
        content: row.try_get("content").map_err(unavailable)?,
        author_id: UserId(blob_to_uuid(
            &row.try_get::<Vec<u8>, _>("author_id").map_err(unavailable)?,
        )?),
        author_display: row.try_get("author_display").map_err(unavailable)?,
        article_key: row.try_get("article_key").map_err(unavailable)?,
        parent_id: parent.map(|p| blob_to_uuid(&p).map(CommentId)).transpose()?,
        created_at: row.try_get("created_at").map_err(unavailable)?,
        is_deleted: row.try_get("is_deleted").map_err(unavailable)?,
    })
}

#[async_trait]
impl CommentStore for SqliteStore {
    async fn list(&self, article_key: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, content, author_id, author_display, article_key, parent_id, created_at, is_deleted
             FROM comments WHERE article_key = ? ORDER BY created_at ASC, seq ASC",
        )
        .bind(article_key)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(comment_from_row).collect()
    }

    /// Checks the parent and inserts inside one transaction, so a reply can
    /// never reference a comment of another article.
    async fn insert(&self, new: NewComment) -> Result<Comment> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        if let Some(parent) = new.parent_id {
            let exists = sqlx::query("SELECT 1 FROM comments WHERE id = ? AND article_key = ?")
                .bind(uuid_to_blob(parent.0))
                .bind(&new.article_key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unavailable)?;
            if exists.is_none() {
                return Err(DomainError::not_found("comment", parent));
            }
        }

        let (_, created_at): (u64, DateTime<Utc>) = self.clock.lock().tick();
        let comment = Comment {
            id: CommentId::new(),
            content: new.content,
            author_id: new.author_id,
            author_display: new.author_display,
            article_key: new.article_key,
            parent_id: new.parent_id,
            created_at,
            is_deleted: false,
        };

        sqlx::query(
            "INSERT INTO comments (id, content, author_id, author_display, article_key, parent_id, created_at, is_deleted)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(uuid_to_blob(comment.id.0))
        .bind(&comment.content)
        .bind(uuid_to_blob(comment.author_id.0))
        .bind(&comment.author_display)
        .bind(&comment.article_key)
        .bind(comment.parent_id.map(|p| uuid_to_blob(p.0)))
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        Ok(comment)
    }

    async fn mark_deleted(&self, id: CommentId, actor: UserId) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let row = sqlx::query("SELECT author_id FROM comments WHERE id = ?")
            .bind(uuid_to_blob(id.0))
            .fetch_optional(&mut *tx)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| DomainError::not_found("comment", id))?;
        let author = blob_to_uuid(&row.try_get::<Vec<u8>, _>("author_id").map_err(unavailable)?)?;
        if author != actor.0 {
            return Err(DomainError::Forbidden(format!(
                "comment {id} belongs to another author"
            )));
        }

        sqlx::query("UPDATE comments SET is_deleted = 1 WHERE id = ?")
            .bind(uuid_to_blob(id.0))
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }
}

#[async_trait]
impl NewsletterStore for SqliteStore {
    async fn subscribe(&self, email: &str) -> Result<SignupOutcome> {
        let result = sqlx::query(
            "INSERT INTO newsletter_subscribers (email, subscribed_at) VALUES (?, ?)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(if result.rows_affected() == 0 {
            SignupOutcome::AlreadySubscribed
        } else {
            SignupOutcome::Subscribed
        })
    }
}

fn account_from_row(row: &SqliteRow) -> Result<Account> {
    Ok(Account {
        identity: Identity {
            id: UserId(blob_to_uuid(&row.try_get::<Vec<u8>, _>("id").map_err(unavailable)?)?),
            display_label: row.try_get("display_label").map_err(unavailable)?,
        },
        email: row.try_get("email").map_err(unavailable)?,
        password_hash: row.try_get("password_hash").map_err(unavailable)?,
        created_at: row.try_get("created_at").map_err(unavailable)?,
    })
}

const ACCOUNT_COLUMNS: &str = "SELECT id, email, display_label, password_hash, created_at FROM accounts";

#[async_trait]
impl AccountStore for SqliteStore {
    async fn create(&self, account: Account) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO accounts (id, email, display_label, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(uuid_to_blob(account.identity.id.0))
        .bind(&account.email)
        .bind(&account.identity.display_label)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::Conflict("An account with this email already exists.".into()));
        }
        Ok(())
    }

    async fn by_email(&self, email: &str) -> Result<Option<Account>> {
        sqlx::query(&format!("{ACCOUNT_COLUMNS} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .as_ref()
            .map(account_from_row)
            .transpose()
    }

    async fn by_id(&self, id: UserId) -> Result<Option<Account>> {
        sqlx::query(&format!("{ACCOUNT_COLUMNS} WHERE id = ?"))
            .bind(uuid_to_blob(id.0))
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .as_ref()
            .map(account_from_row)
            .transpose()
    }
}
