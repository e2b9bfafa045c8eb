//! # In-memory stores
//!
//! Process-local implementations of the comment, newsletter and account ports.
//! Used for development (`database.url = "memory"`) and in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    Account, AccountStore, Comment, CommentId, CommentStore, DomainError, NewComment,
    NewsletterStore, Result, SignupOutcome, UserId,
};
use parking_lot::Mutex;

use crate::clock::MonotonicClock;

struct Row {
    seq: u64,
    comment: Comment,
}

#[derive(Default)]
pub struct MemoryCommentStore {
    rows: DashMap<CommentId, Row>,
    clock: Mutex<MonotonicClock>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn list(&self, article_key: &str) -> Result<Vec<Comment>> {
        let mut rows: Vec<(DateTime<Utc>, u64, Comment)> = self
            .rows
            .iter()
            .filter(|row| row.comment.article_key == article_key)
            .map(|row| (row.comment.created_at, row.seq, row.comment.clone()))
            .collect();
        rows.sort_by_key(|(created_at, seq, _)| (*created_at, *seq));
        Ok(rows.into_iter().map(|(_, _, comment)| comment).collect())
    }

    async fn insert(&self, new: NewComment) -> Result<Comment> {
        if let Some(parent) = new.parent_id {
            let same_article = self
                .rows
                .get(&parent)
                .is_some_and(|row| row.comment.article_key == new.article_key);
            if !same_article {
                return Err(DomainError::not_found("comment", parent));
            }
        }

        let (seq, created_at) = self.clock.lock().tick();
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
        self.rows.insert(comment.id, Row { seq, comment: comment.clone() });
        Ok(comment)
    }

    async fn mark_deleted(&self, id: CommentId, actor: UserId) -> Result<()> {
        let mut row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("comment", id))?;
        if row.comment.author_id != actor {
            return Err(DomainError::Forbidden(format!(
                "comment {id} belongs to another author"
            )));
        }
        row.comment.is_deleted = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNewsletterStore {
    subscribers: DashMap<String, DateTime<Utc>>,
}

impl MemoryNewsletterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, email: &str) -> bool {
        self.subscribers.contains_key(email)
    }
}

#[async_trait]
impl NewsletterStore for MemoryNewsletterStore {
    async fn subscribe(&self, email: &str) -> Result<SignupOutcome> {
        match self.subscribers.entry(email.to_string()) {
            Entry::Occupied(_) => Ok(SignupOutcome::AlreadySubscribed),
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                Ok(SignupOutcome::Subscribed)
            }
        }
    }
}

/// Accounts keyed by normalised email.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: DashMap<String, Account>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, account: Account) -> Result<()> {
        match self.accounts.entry(account.email.clone()) {
            Entry::Occupied(_) => {
                Err(DomainError::Conflict("An account with this email already exists.".into()))
            }
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }

    async fn by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.get(email).map(|a| a.value().clone()))
    }

    async fn by_id(&self, id: UserId) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .iter()
            .find(|a| a.identity.id == id)
            .map(|a| a.value().clone()))
    }
}
