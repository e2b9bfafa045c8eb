use axum::extract::{Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use domains::{DomainError, Session};
use serde::Deserialize;

use super::{html, safe_next};
use crate::error::ApiResult;
use crate::extractors::{SignedIn, Viewer};
use crate::state::AppState;
use crate::views::{Layout, LoginPage, ProfilePage};

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginAction {
    #[default]
    Signin,
    Signup,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub action: LoginAction,
    pub next: Option<String>,
}

pub async fn login_page(
    viewer: Viewer,
    Query(query): Query<LoginQuery>,
) -> ApiResult<Response> {
    let next = safe_next(query.next.as_deref());
    if viewer.identity.is_some() {
        return Ok(Redirect::to(&next).into_response());
    }
    let page: Html<String> = html(LoginPage {
        layout: Layout::new("Sign in", None),
        email: String::new(),
        next,
        error: None,
    })?;
    Ok(page.into_response())
}

/// Signs in, or creates the account first when `action=signup`.
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> ApiResult<Response> {
    let next = safe_next(form.next.as_deref());
    let result: Result<Session, DomainError> = async {
        if form.action == LoginAction::Signup {
            state.accounts.sign_up(&form.email, &form.password).await?;
        }
        state.accounts.sign_in(&form.email, &form.password).await
    }
    .await;

    match result {
        Ok(session) => {
            let cookie = state.session.issue(&session.token);
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&next)).into_response())
        }
        Err(err) => {
            let (status, message) = match &err {
                DomainError::NotAuthenticated => {
                    (StatusCode::UNAUTHORIZED, "Incorrect email or password.".to_string())
                }
                DomainError::ValidationFailed(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.user_message()),
                DomainError::Conflict(_) => (StatusCode::CONFLICT, err.user_message()),
                _ => {
                    tracing::error!(error = %err, "sign-in failed");
                    (StatusCode::SERVICE_UNAVAILABLE, err.user_message())
                }
            };
            let page = html(LoginPage {
                layout: Layout::new("Sign in", None),
                email: form.email,
                next,
                error: Some(message),
            })?;
            Ok((status, page).into_response())
        }
    }
}

pub async fn logout(State(state): State<AppState>, viewer: Viewer) -> ApiResult<Response> {
    if let Some(token) = &viewer.token {
        state.accounts.sign_out(token).await?;
    }
    Ok(([(header::SET_COOKIE, state.session.clear())], Redirect::to("/")).into_response())
}

/// The account behind the session; a vanished account counts as signed out.
pub async fn profile(
    State(state): State<AppState>,
    SignedIn(identity): SignedIn,
) -> ApiResult<Html<String>> {
    let profile = state
        .accounts
        .profile(identity.id)
        .await?
        .ok_or(DomainError::NotAuthenticated)?;
    html(ProfilePage {
        layout: Layout::new("Profile", Some(&identity)),
        label: profile.identity.display_label,
        email: profile.email,
        member_since: profile.member_since.format("%-d %B %Y").to_string(),
    })
}
