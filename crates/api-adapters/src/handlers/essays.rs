use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use domains::{CommentId, DomainError, Essay};
use serde::Deserialize;
use services::{CommentSection, LoadStatus};
use uuid::Uuid;

use super::html;
use crate::error::{ApiError, ApiResult};
use crate::extractors::Viewer;
use crate::state::AppState;
use crate::views::{CategoryPage, CommentsView, EssayCard, EssayPage, IndexPage, Layout};

/// Renders the home page: the hero essay and the latest grid.
pub async fn index(State(state): State<AppState>, viewer: Viewer) -> ApiResult<Html<String>> {
    let essays = state.catalog.latest().await?;
    let hero = state.catalog.hero().await?;
    let rest = essays
        .iter()
        .filter(|e| hero.as_ref().map_or(true, |h| h.slug != e.slug))
        .map(EssayCard::from)
        .collect();

    html(IndexPage {
        layout: Layout::new("Essays", viewer.identity.as_ref()),
        hero: hero.as_ref().map(EssayCard::from),
        essays: rest,
    })
}

#[derive(Debug, Deserialize)]
pub struct EssayQuery {
    /// Comment whose reply form should be open
    pub reply: Option<String>,
    /// Comma-separated ids of folded threads
    pub collapse: Option<String>,
}

/// Renders an essay with its comment section.
pub async fn show(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Query(query): Query<EssayQuery>,
) -> ApiResult<Response> {
    let essay = state.catalog.require(&slug).await?;
    let section = load_section(&state, &viewer, &essay).await;

    for raw in query.collapse.as_deref().unwrap_or_default().split(',').filter(|s| !s.is_empty()) {
        // Stale links may name comments that are gone; those are skipped.
        let folded = Uuid::parse_str(raw.trim())
            .map_err(|_| DomainError::not_found("comment", raw))
            .and_then(|id| section.collapse(CommentId(id)));
        if let Err(err) = folded {
            tracing::debug!(error = %err, "ignoring collapse target");
        }
    }

    let mut notice = None;
    if let Some(raw) = query.reply.as_deref() {
        let opened = Uuid::parse_str(raw)
            .map_err(|_| DomainError::not_found("comment", raw))
            .and_then(|id| section.begin_reply(CommentId(id)));
        if let Err(err) = opened {
            notice = Some(err.user_message());
        }
    }

    render_essay(&viewer, &essay, &section, notice, StatusCode::OK)
}

/// Lists the essays of one category; unknown slugs are 404.
pub async fn category(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(slug): Path<String>,
) -> ApiResult<Html<String>> {
    let (category, essays) = state.catalog.in_category(&slug).await?;
    html(CategoryPage {
        layout: Layout::new(category.name.clone(), viewer.identity.as_ref()),
        name: category.name,
        essays: essays.iter().map(EssayCard::from).collect(),
    })
}

/// Mounts and loads the section for `essay`, counting load failures.
pub(crate) async fn load_section(state: &AppState, viewer: &Viewer, essay: &Essay) -> CommentSection {
    let section = state.comment_section(viewer.identity.clone(), &essay.slug);
    section.load().await;
    if matches!(section.snapshot().status, LoadStatus::Unavailable(_)) {
        state.metrics.comment_load_failures.inc();
    }
    section
}

pub(crate) fn render_essay(
    viewer: &Viewer,
    essay: &Essay,
    section: &CommentSection,
    notice: Option<String>,
    status: StatusCode,
) -> ApiResult<Response> {
    let snapshot = section.snapshot();
    let comments = CommentsView::build(&essay.slug, &snapshot, Utc::now(), notice);
    let page = EssayPage::new(Layout::new(essay.title.clone(), viewer.identity.as_ref()), essay, comments);
    Ok((status, html(page)?).into_response())
}

/// Shows the essay again with `err` above the comment form, or hands the
/// error to the generic error page when it is not about the comment itself.
pub(crate) fn render_essay_error(
    viewer: &Viewer,
    essay: &Essay,
    section: &CommentSection,
    err: DomainError,
) -> ApiResult<Response> {
    match err {
        DomainError::NotAuthenticated => Err(ApiError::Domain(err)),
        err => {
            let status = ApiError::Domain(err.clone()).status_code();
            render_essay(viewer, essay, section, Some(err.user_message()), status)
        }
    }
}
