//! In-process HTTP harness: the real router over in-memory stores and a
//! temporary essays directory.

use std::sync::Arc;

use api_adapters::{AppState, Metrics, SessionCookie};
use auth_adapters::SessionAccounts;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use domains::AccountProvider;
use services::{EssayCatalog, NewsletterService};
use storage_adapters::{FsEssayStore, MemoryAccountStore, MemoryCommentStore, MemoryNewsletterStore};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::fixtures::{write_essay, ARTICLE};

pub const COOKIE_NAME: &str = "marginalia_session";
pub const PASSWORD: &str = "secret1";

pub struct TestApp {
    pub router: Router,
    pub accounts: Arc<SessionAccounts>,
    pub comments: Arc<MemoryCommentStore>,
    pub newsletter: Arc<MemoryNewsletterStore>,
    pub metrics: Arc<Metrics>,
    _content: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// Two essays: the featured `on-margins` (Filosofia) and `old-maps` (Storia).
    pub fn new() -> Self {
        let content = tempfile::tempdir().expect("create content dir");
        let essays_dir = content.path().join("essays");
        std::fs::create_dir(&essays_dir).expect("create essays dir");
        write_essay(&essays_dir, ARTICLE, "On Margins", "Filosofia", "2024-03-01", true);
        write_essay(&essays_dir, "old-maps", "Old Maps", "Storia", "2023-06-15", false);

        let accounts = Arc::new(SessionAccounts::new(
            Arc::new(MemoryAccountStore::new()),
            chrono::Duration::hours(1),
        ));
        let comments = Arc::new(MemoryCommentStore::new());
        let newsletter = Arc::new(MemoryNewsletterStore::new());
        let metrics = Arc::new(Metrics::new());

        let state = AppState {
            comments: comments.clone(),
            catalog: EssayCatalog::new(Arc::new(FsEssayStore::new(essays_dir))),
            accounts: accounts.clone(),
            newsletter: NewsletterService::new(newsletter.clone()),
            metrics: metrics.clone(),
            session: SessionCookie::new(COOKIE_NAME, false, 1),
        };
        let router = api_adapters::router(state, &content.path().join("static"));

        Self { router, accounts, comments, newsletter, metrics, _content: content }
    }

    /// Creates an account and returns a `Cookie` header value for it.
    pub async fn sign_in(&self, email: &str) -> String {
        self.accounts.sign_up(email, PASSWORD).await.expect("sign up");
        let session = self.accounts.sign_in(email, PASSWORD).await.expect("sign in");
        format!("{COOKIE_NAME}={}", session.token.as_str())
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).expect("build request")).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.to_string())).expect("build request")).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        TestResponse { status, headers, body: String::from_utf8_lossy(&bytes).into_owned() }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
