use std::sync::Arc;

use axum::http::{header, HeaderMap};
use domains::{AccountProvider, CommentStore, Identity, SessionToken};
use services::{CommentSection, EssayCatalog, IdentityCell, NewsletterService};

use crate::metrics::Metrics;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<dyn CommentStore>,
    pub catalog: EssayCatalog,
    pub accounts: Arc<dyn AccountProvider>,
    pub newsletter: NewsletterService,
    pub metrics: Arc<Metrics>,
    pub session: SessionCookie,
}

impl AppState {
    /// Mounts the comment section of `article_key` for a viewer resolved
    /// from the current request.
    pub fn comment_section(&self, viewer: Option<Identity>, article_key: &str) -> CommentSection {
        let identity = Arc::new(IdentityCell::new(viewer));
        CommentSection::mount(self.comments.clone(), identity, article_key)
    }
}

/// Name and attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool, ttl_hours: u32) -> Self {
        Self { name: name.into(), secure, max_age_secs: i64::from(ttl_hours) * 3600 }
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn issue(&self, token: &SessionToken) -> String {
        self.build(token.as_str(), self.max_age_secs)
    }

    /// `Set-Cookie` value that removes the cookie.
    pub fn clear(&self) -> String {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Finds the session token among the request's `Cookie` headers.
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionToken> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == self.name && !value.is_empty())
            .map(|(_, value)| SessionToken(value.to_string()))
    }
}
