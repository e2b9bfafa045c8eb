//! Askama page templates and the flat view models they render.
//!
//! Templates never recurse: the comment thread arrives as the pre-order
//! row list produced by the visibility policy.

use askama::Template;
use chrono::{DateTime, Utc};
use domains::{Category, CommentId, Essay, Identity};
use services::catalog::categories;
use services::comments::{LoadStatus, NodeState, SectionSnapshot};
use services::format::{paragraphs, time_ago};
use services::visibility::{ReplyAction, ThreadRow};

/// Chrome shared by every page.
pub struct Layout {
    pub title: String,
    pub viewer: Option<String>,
    pub categories: Vec<Category>,
}

impl Layout {
    pub fn new(title: impl Into<String>, viewer: Option<&Identity>) -> Self {
        Self {
            title: title.into(),
            viewer: viewer.map(|v| v.display_label.clone()),
            categories: categories(),
        }
    }
}

pub struct EssayCard {
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub category: String,
    pub author: String,
    pub date: String,
    pub image: String,
    pub excerpt: String,
}

impl From<&Essay> for EssayCard {
    fn from(essay: &Essay) -> Self {
        Self {
            slug: essay.slug.clone(),
            title: essay.title.clone(),
            subtitle: essay.subtitle.clone(),
            category: essay.category.clone(),
            author: essay.author.clone(),
            date: essay.date.map(|d| d.format("%-d %B %Y").to_string()).unwrap_or_default(),
            image: essay.image.clone(),
            excerpt: essay.excerpt.clone(),
        }
    }
}

/// One rendered line of the comment thread.
pub struct RowView {
    pub is_teaser: bool,
    pub id: String,
    pub depth: usize,
    pub author: String,
    pub when: String,
    pub body: String,
    pub deleted: bool,
    pub can_reply: bool,
    pub sign_in_to_reply: bool,
    pub can_delete: bool,
    /// Reply form open under this comment
    pub replying: bool,
    pub teaser_label: String,
    /// Has replies, so the thread can be folded
    pub collapsible: bool,
    pub collapsed: bool,
    /// Same page with this thread's fold state flipped
    pub toggle_href: String,
}

/// Link that flips the fold state of `id`, keeping the other folded threads.
fn toggle_href(slug: &str, snapshot: &SectionSnapshot, id: CommentId) -> String {
    let mut ids: Vec<CommentId> = snapshot.collapsed().filter(|c| *c != id).collect();
    if !snapshot.is_collapsed(id) {
        ids.push(id);
        ids.sort();
    }
    if ids.is_empty() {
        return format!("/essay/{slug}#c-{id}");
    }
    let list: Vec<String> = ids.iter().map(CommentId::to_string).collect();
    format!("/essay/{slug}?collapse={}#c-{id}", list.join(","))
}

impl RowView {
    fn from_row(row: &ThreadRow, slug: &str, snapshot: &SectionSnapshot, now: DateTime<Utc>) -> Self {
        match row {
            ThreadRow::Comment(view) => Self {
                is_teaser: false,
                id: view.id.to_string(),
                depth: view.depth,
                author: view.author_display.clone(),
                when: time_ago(view.created_at, now),
                body: view.body.as_str().to_string(),
                deleted: view.body.is_deleted(),
                can_reply: view.reply == ReplyAction::Reply,
                sign_in_to_reply: view.reply == ReplyAction::SignInToReply,
                can_delete: view.can_delete,
                replying: snapshot.node_state(view.id) == NodeState::Replying,
                teaser_label: String::new(),
                collapsible: view.reply_count > 0,
                collapsed: view.collapsed,
                toggle_href: toggle_href(slug, snapshot, view.id),
            },
            ThreadRow::Teaser(teaser) => Self {
                is_teaser: true,
                id: teaser.parent_id.to_string(),
                depth: teaser.depth,
                author: String::new(),
                when: String::new(),
                body: String::new(),
                deleted: false,
                can_reply: false,
                sign_in_to_reply: false,
                can_delete: false,
                replying: false,
                teaser_label: teaser.label(),
                collapsible: false,
                collapsed: false,
                toggle_href: String::new(),
            },
        }
    }
}

pub struct CommentsView {
    pub slug: String,
    pub total: usize,
    pub rows: Vec<RowView>,
    pub signed_in: bool,
    pub unavailable: Option<String>,
    /// Message from a rejected action, shown above the form
    pub error: Option<String>,
}

impl CommentsView {
    pub fn build(
        slug: &str,
        snapshot: &SectionSnapshot,
        now: DateTime<Utc>,
        error: Option<String>,
    ) -> Self {
        let rows = snapshot
            .rows()
            .iter()
            .map(|row| RowView::from_row(row, slug, snapshot, now))
            .collect();
        let unavailable = match &snapshot.status {
            LoadStatus::Unavailable(message) => Some(message.clone()),
            LoadStatus::Loading | LoadStatus::Ready => None,
        };
        Self {
            slug: slug.to_string(),
            total: snapshot.total,
            rows,
            signed_in: snapshot.viewer.is_some(),
            unavailable,
            error,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub layout: Layout,
    pub hero: Option<EssayCard>,
    pub essays: Vec<EssayCard>,
}

#[derive(Template)]
#[template(path = "essay.html")]
pub struct EssayPage {
    pub layout: Layout,
    pub essay: EssayCard,
    pub paragraphs: Vec<String>,
    pub comments: CommentsView,
}

impl EssayPage {
    pub fn new(layout: Layout, essay: &Essay, comments: CommentsView) -> Self {
        Self {
            layout,
            essay: EssayCard::from(essay),
            paragraphs: paragraphs(&essay.content),
            comments,
        }
    }
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryPage {
    pub layout: Layout,
    pub name: String,
    pub essays: Vec<EssayCard>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub layout: Layout,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub layout: Layout,
    pub label: String,
    pub email: String,
    /// Account creation date, e.g. "3 March 2024"
    pub member_since: String,
}

#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeletePage {
    pub layout: Layout,
    pub slug: String,
    pub comment_id: String,
    pub author: String,
    pub excerpt: String,
}

/// Static pages, results and errors.
#[derive(Template)]
#[template(path = "message.html")]
pub struct MessagePage {
    pub layout: Layout,
    pub heading: String,
    pub paragraphs: Vec<String>,
    pub back_href: String,
    pub back_label: String,
}

impl MessagePage {
    pub fn new(layout: Layout, heading: impl Into<String>, body: &str) -> Self {
        Self {
            layout,
            heading: heading.into(),
            paragraphs: paragraphs(body),
            back_href: "/".to_string(),
            back_label: "Back to the essays".to_string(),
        }
    }

    pub fn back(mut self, href: impl Into<String>, label: impl Into<String>) -> Self {
        self.back_href = href.into();
        self.back_label = label.into();
        self
    }
}
