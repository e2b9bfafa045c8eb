//! Decides what a viewer gets to see of a comment thread.
//!
//! Signed-in viewers see everything. Signed-out viewers see root comments
//! only; replies under a root collapse into a single teaser that reports how
//! many direct replies there are. Nothing deeper is ever described to them.
//!
//! A collapsed thread keeps its header row; its body and everything under it
//! are left out of the plan.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use domains::{CommentId, CommentNode, Identity, UserId};

/// Shown instead of the body of a soft-deleted comment.
pub const DELETED_PLACEHOLDER: &str = "[Comment deleted by author]";

/// Rendering outcome for a node or a group of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Full,
    Hidden,
    Teaser,
}

/// Outcome for a single node at `depth`.
pub fn node_visibility(depth: usize, authenticated: bool) -> Visibility {
    if !authenticated && depth > 0 {
        Visibility::Hidden
    } else {
        Visibility::Full
    }
}

/// Outcome for the replies directly under `node`, which sits at `depth`.
///
/// `Hidden` also covers "no replies to show".
pub fn children_visibility(node: &CommentNode, depth: usize, authenticated: bool) -> Visibility {
    if node.children.is_empty() {
        Visibility::Hidden
    } else if authenticated {
        Visibility::Full
    } else if depth == 0 {
        Visibility::Teaser
    } else {
        Visibility::Hidden
    }
}

/// What to print where the comment text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Deleted,
}

impl Body {
    pub fn as_str(&self) -> &str {
        match self {
            Body::Text(text) => text,
            Body::Deleted => DELETED_PLACEHOLDER,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Body::Deleted)
    }
}

/// Reply affordance offered under a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyAction {
    Reply,
    SignInToReply,
    None,
}

/// A comment as the viewer gets to see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub id: CommentId,
    pub depth: usize,
    pub author_display: String,
    pub created_at: DateTime<Utc>,
    pub body: Body,
    pub reply: ReplyAction,
    pub can_delete: bool,
    /// Number of direct replies in the stored tree
    pub reply_count: usize,
    pub collapsed: bool,
}

/// Placeholder standing in for the replies of a root comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeaserView {
    pub parent_id: CommentId,
    pub depth: usize,
    pub reply_count: usize,
}

impl TeaserView {
    pub fn label(&self) -> String {
        let noun = if self.reply_count == 1 { "reply" } else { "replies" };
        format!("Sign in to read {} {}", self.reply_count, noun)
    }
}

/// One line of the flattened, pre-order render plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadRow {
    Comment(CommentView),
    Teaser(TeaserView),
}

/// Flattens `forest` into the rows `viewer` may see, in display order.
pub fn plan(forest: &[CommentNode], viewer: Option<&Identity>) -> Vec<ThreadRow> {
    plan_collapsed(forest, viewer, &BTreeSet::new())
}

/// Like [`plan`], with the threads in `collapsed` folded.
pub fn plan_collapsed(
    forest: &[CommentNode],
    viewer: Option<&Identity>,
    collapsed: &BTreeSet<CommentId>,
) -> Vec<ThreadRow> {
    let mut rows = Vec::new();
    for root in forest {
        visit(root, 0, viewer, collapsed, &mut rows);
    }
    rows
}

fn visit(
    node: &CommentNode,
    depth: usize,
    viewer: Option<&Identity>,
    collapsed: &BTreeSet<CommentId>,
    rows: &mut Vec<ThreadRow>,
) {
    let authenticated = viewer.is_some();
    if node_visibility(depth, authenticated) == Visibility::Hidden {
        return;
    }

    let folded = !node.children.is_empty() && collapsed.contains(&node.comment.id);
    rows.push(ThreadRow::Comment(view(node, depth, viewer.map(|v| v.id), folded)));
    if folded {
        return;
    }

    match children_visibility(node, depth, authenticated) {
        Visibility::Full => {
            for child in &node.children {
                visit(child, depth + 1, viewer, collapsed, rows);
            }
        }
        Visibility::Teaser => rows.push(ThreadRow::Teaser(TeaserView {
            parent_id: node.comment.id,
            depth: depth + 1,
            reply_count: node.children.len(),
        })),
        Visibility::Hidden => {}
    }
}

fn view(node: &CommentNode, depth: usize, viewer: Option<UserId>, collapsed: bool) -> CommentView {
    let comment = &node.comment;
    let deleted = comment.is_deleted;
    let reply = match (deleted, viewer.is_some()) {
        (true, _) => ReplyAction::None,
        (false, true) => ReplyAction::Reply,
        (false, false) => ReplyAction::SignInToReply,
    };
    CommentView {
        id: comment.id,
        depth,
        author_display: comment.author_display.clone(),
        created_at: comment.created_at,
        body: if deleted { Body::Deleted } else { Body::Text(comment.content.clone()) },
        reply,
        can_delete: !deleted && viewer == Some(comment.author_id),
        reply_count: node.children.len(),
        collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_rule() {
        assert_eq!(node_visibility(0, false), Visibility::Full);
        assert_eq!(node_visibility(1, false), Visibility::Hidden);
        assert_eq!(node_visibility(7, true), Visibility::Full);
    }

    #[test]
    fn test_teaser_label_pluralises() {
        let mut teaser = TeaserView { parent_id: CommentId::new(), depth: 1, reply_count: 1 };
        assert_eq!(teaser.label(), "Sign in to read 1 reply");
        teaser.reply_count = 3;
        assert_eq!(teaser.label(), "Sign in to read 3 replies");
    }

    #[test]
    fn test_deleted_body_uses_placeholder() {
        assert_eq!(Body::Deleted.as_str(), DELETED_PLACEHOLDER);
        assert_eq!(Body::Text("hi".into()).as_str(), "hi");
    }
}
