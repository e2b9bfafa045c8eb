use axum::extract::{Form, State};
use axum::response::Html;
use domains::SignupOutcome;
use serde::Deserialize;

use super::html;
use crate::error::ApiResult;
use crate::extractors::Viewer;
use crate::state::AppState;
use crate::views::{Layout, MessagePage};

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
}

pub async fn subscribe(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(form): Form<SignupForm>,
) -> ApiResult<Html<String>> {
    let outcome = state.newsletter.subscribe(&form.email).await?;
    let body = match outcome {
        SignupOutcome::Subscribed => {
            state.metrics.newsletter_signups.inc();
            "Thank you. The next essay will arrive in your inbox."
        }
        SignupOutcome::AlreadySubscribed => "This address is already on the list.",
    };
    let (back, label) = match viewer.identity {
        Some(_) => ("/profile", "Back to your profile"),
        None => ("/", "Back to the essays"),
    };
    html(
        MessagePage::new(Layout::new("Newsletter", viewer.identity.as_ref()), "Newsletter", body)
            .back(back, label),
    )
}
