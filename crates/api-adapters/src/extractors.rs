use axum::extract::FromRequestParts;
use axum::http::request;
use domains::{DomainError, Identity, SessionToken};

use crate::error::ApiError;
use crate::state::AppState;

/// Whoever is making the request, resolved from the session cookie.
/// Unknown or expired tokens read as signed out.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub identity: Option<Identity>,
    pub token: Option<SessionToken>,
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        req: &mut request::Parts,
        state: &AppState,
    ) -> Result<Viewer, ApiError> {
        let Some(token) = state.session.read(&req.headers) else {
            return Ok(Viewer::default());
        };
        let identity = match state.accounts.resolve(&token).await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(error = %err, "could not resolve session, treating viewer as signed out");
                None
            }
        };
        Ok(Viewer { identity, token: Some(token) })
    }
}

/// A viewer that must be signed in; otherwise the request is sent to `/login`.
pub struct SignedIn(pub Identity);

impl FromRequestParts<AppState> for SignedIn {
    type Rejection = ApiError;

    async fn from_request_parts(
        req: &mut request::Parts,
        state: &AppState,
    ) -> Result<SignedIn, ApiError> {
        Viewer::from_request_parts(req, state)
            .await?
            .identity
            .map(SignedIn)
            .ok_or(ApiError::Domain(DomainError::NotAuthenticated))
    }
}
