//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Account, Comment, CommentId, Essay, Identity, NewComment, Profile, Session, SessionToken,
    SignupOutcome, UserId,
};

/// Persistence contract for comments.
///
/// Insert and mark-deleted are atomic per row; callers never assume
/// read-after-write consistency beyond a fresh `list`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// All comments of an article, oldest first.
    async fn list(&self, article_key: &str) -> Result<Vec<Comment>>;

    /// Stores a new comment and returns it with its assigned id and timestamp.
    /// Fails with `NotFound` if `parent_id` names no comment of the same article.
    async fn insert(&self, comment: NewComment) -> Result<Comment>;

    /// Sets `is_deleted`. Fails with `Forbidden` unless `actor` wrote the comment.
    async fn mark_deleted(&self, id: CommentId, actor: UserId) -> Result<()>;
}

/// Read-only access to the essay collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EssayStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Essay>>;
    async fn by_slug(&self, slug: &str) -> Result<Option<Essay>>;
}

/// Account and session management.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;
    /// Returns the identity behind a live session, `None` for unknown or expired tokens.
    async fn resolve(&self, token: &SessionToken) -> Result<Option<Identity>>;
    async fn sign_out(&self, token: &SessionToken) -> Result<()>;
    async fn profile(&self, id: UserId) -> Result<Option<Profile>>;
}

/// Durable account records. Sessions are not stored here.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create(&self, account: Account) -> Result<()>;
    /// `email` is already normalised by the caller.
    async fn by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn by_id(&self, id: UserId) -> Result<Option<Account>>;
}

/// Newsletter signups.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NewsletterStore: Send + Sync {
    /// `email` is already normalised by the caller.
    async fn subscribe(&self, email: &str) -> Result<SignupOutcome>;
}

/// Callback invoked with the new identity whenever it changes.
pub type IdentityListener = Box<dyn Fn(Option<Identity>) + Send + Sync>;

/// Source of the current viewer identity.
pub trait IdentityService: Send + Sync {
    fn current_user(&self) -> Option<Identity>;

    /// Registers `listener` until the returned handle is dropped.
    fn on_change(&self, listener: IdentityListener) -> Subscription;
}

/// Handle to a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
