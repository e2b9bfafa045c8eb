//! # Domain Models
//!
//! These structs represent the core entities of Marginalia.
//! Comments are stored flat and rebuilt into a tree for display.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a comment. Assigned by the comment store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn new() -> Self {
        CommentId(Uuid::new_v4())
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an authenticated user, issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        UserId(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The viewer as seen by the comment system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    /// Human-readable label, e.g. the local part of the account email
    pub display_label: String,
}

/// A comment exactly as the store holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author_id: UserId,
    pub author_display: String,
    /// Slug of the essay this comment belongs to
    pub article_key: String,
    /// `None` marks a root comment
    pub parent_id: Option<CommentId>,
    /// Assigned by the store at insert time, strictly increasing
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag. Never reverts once set.
    pub is_deleted: bool,
}

/// A comment submission, before the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,
    pub author_id: UserId,
    pub author_display: String,
    pub article_key: String,
    pub parent_id: Option<CommentId>,
}

/// A comment with its replies, ordered oldest first.
///
/// Ownership only flows from parent to children; nodes never point back up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(comment: Comment) -> Self {
        Self { comment, children: Vec::new() }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(CommentNode::subtree_len).sum::<usize>()
    }

    /// Depth-first search for a node by id.
    pub fn find(&self, id: CommentId) -> Option<&CommentNode> {
        if self.comment.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// An essay loaded from the content directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Essay {
    /// File name without extension; also the article key for comments
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub category: String,
    pub author: String,
    /// Publication date. Undated essays sort after dated ones.
    pub date: Option<NaiveDate>,
    pub image: String,
    pub excerpt: String,
    /// Raw body below the front matter
    pub content: String,
    pub featured: bool,
}

/// A browsable essay category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// The URL slug (e.g., "storia" for /category/storia)
    pub slug: String,
    pub name: String,
}

impl Category {
    pub fn new(slug: &str, name: &str) -> Self {
        Self { slug: slug.to_string(), name: name.to_string() }
    }

    pub fn contains(&self, essay: &Essay) -> bool {
        let category = essay.category.trim().to_lowercase();
        category == self.slug || category == self.name.to_lowercase()
    }
}

/// Opaque session token handed to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A registered reader as the account store keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub identity: Identity,
    /// Normalised address, unique across accounts
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// What the profile page shows about the signed-in reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub identity: Identity,
    pub email: String,
    pub member_since: DateTime<Utc>,
}

impl From<Account> for Profile {
    fn from(account: Account) -> Self {
        Self { identity: account.identity, email: account.email, member_since: account.created_at }
    }
}

/// A signed-in session as returned by the account provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub identity: Identity,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a newsletter signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Subscribed,
    AlreadySubscribed,
}
