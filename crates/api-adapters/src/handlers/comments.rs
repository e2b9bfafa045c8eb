use axum::extract::{Form, Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use domains::{CommentId, DomainError};
use serde::Deserialize;
use uuid::Uuid;

use super::essays::{load_section, render_essay_error};
use super::html;
use crate::error::{ApiError, ApiResult};
use crate::extractors::Viewer;
use crate::state::AppState;
use crate::views::{ConfirmDeletePage, Layout};

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub content: String,
}

fn anchor(slug: &str, id: CommentId) -> Redirect {
    Redirect::to(&format!("/essay/{slug}#c-{id}"))
}

/// Posts a top-level comment.
pub async fn create(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Form(form): Form<CommentForm>,
) -> ApiResult<Response> {
    let essay = state.catalog.require(&slug).await?;
    let section = load_section(&state, &viewer, &essay).await;

    match section.submit_root(&form.content).await {
        Ok(id) => {
            state.metrics.comments_posted.inc();
            Ok(anchor(&essay.slug, id).into_response())
        }
        Err(err) => render_essay_error(&viewer, &essay, &section, err),
    }
}

/// Posts a reply under `parent`.
pub async fn reply(
    State(state): State<AppState>,
    viewer: Viewer,
    Path((slug, parent)): Path<(String, Uuid)>,
    Form(form): Form<CommentForm>,
) -> ApiResult<Response> {
    let parent = CommentId(parent);
    let essay = state.catalog.require(&slug).await?;
    let section = load_section(&state, &viewer, &essay).await;

    if let Err(err) = section.begin_reply(parent) {
        return render_essay_error(&viewer, &essay, &section, err);
    }
    match section.submit_reply(parent, &form.content).await {
        Ok(id) => {
            state.metrics.comments_posted.inc();
            Ok(anchor(&essay.slug, id).into_response())
        }
        Err(err) => render_essay_error(&viewer, &essay, &section, err),
    }
}

/// Asks the viewer to confirm a deletion.
pub async fn confirm_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path((slug, id)): Path<(String, Uuid)>,
) -> ApiResult<Response> {
    let id = CommentId(id);
    let essay = state.catalog.require(&slug).await?;
    let section = load_section(&state, &viewer, &essay).await;

    if let Err(err) = section.request_delete(id) {
        return render_essay_error(&viewer, &essay, &section, err);
    }
    let snapshot = section.snapshot();
    let node = snapshot
        .find(id)
        .ok_or_else(|| ApiError::Domain(DomainError::not_found("comment", id)))?;

    let excerpt: String = node.comment.content.chars().take(280).collect();
    let page: Html<String> = html(ConfirmDeletePage {
        layout: Layout::new("Delete comment", viewer.identity.as_ref()),
        slug: essay.slug.clone(),
        comment_id: id.to_string(),
        author: node.comment.author_display.clone(),
        excerpt,
    })?;
    Ok(page.into_response())
}

/// Confirmed soft delete. The store decides whether the viewer may delete.
pub async fn delete(
    State(state): State<AppState>,
    viewer: Viewer,
    Path((slug, id)): Path<(String, Uuid)>,
) -> ApiResult<Response> {
    let id = CommentId(id);
    let essay = state.catalog.require(&slug).await?;
    let section = load_section(&state, &viewer, &essay).await;

    let deleted = match section.request_delete(id) {
        Ok(()) => section.confirm_delete(id).await,
        Err(err) => Err(err),
    };
    match deleted {
        Ok(()) => {
            state.metrics.comments_deleted.inc();
            Ok(anchor(&essay.slug, id).into_response())
        }
        Err(err) => render_essay_error(&viewer, &essay, &section, err),
    }
}
