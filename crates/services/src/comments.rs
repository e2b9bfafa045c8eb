//! # Comment Section
//!
//! Orchestrates the comment thread of one essay: fetch, build the tree,
//! expose a render plan, run mutations and refetch.
//!
//! The displayed tree is always re-derived from the store after a mutation.
//! No record is ever synthesised locally, so the tree cannot drift from what
//! the store actually assigned (ids, timestamps).

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use domains::{
    Comment, CommentId, CommentNode, CommentStore, DomainError, Identity, IdentityService, NewComment,
    Result, Subscription,
};
use parking_lot::Mutex;

use crate::thread::{build_tree, count_nodes};
use crate::visibility::{plan_collapsed, ThreadRow};

/// Where the last load left the section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    /// The store could not be reached; the section shows an empty state.
    Unavailable(String),
}

/// Client-visible state of a single comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Idle,
    Replying,
    Submitting,
    ConfirmingDelete,
    Deleting,
}

/// Whether a finished load replaced the displayed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load had already been applied; this response was dropped.
    Stale,
}

struct SectionState {
    status: LoadStatus,
    tree: Vec<CommentNode>,
    total: usize,
    viewer: Option<Identity>,
    /// Generation of the newest applied load
    applied: u64,
    nodes: HashMap<CommentId, NodeState>,
    /// Threads folded by the viewer: body and replies hidden
    collapsed: BTreeSet<CommentId>,
}

impl SectionState {
    fn new(viewer: Option<Identity>) -> Self {
        Self {
            status: LoadStatus::Loading,
            tree: Vec::new(),
            total: 0,
            viewer,
            applied: 0,
            nodes: HashMap::new(),
            collapsed: BTreeSet::new(),
        }
    }

    fn find(&self, id: CommentId) -> Option<&CommentNode> {
        self.tree.iter().find_map(|root| root.find(id))
    }

    fn node_state(&self, id: CommentId) -> NodeState {
        self.nodes.get(&id).copied().unwrap_or_default()
    }

    fn set_node_state(&mut self, id: CommentId, node_state: NodeState) {
        if node_state == NodeState::Idle {
            self.nodes.remove(&id);
        } else {
            self.nodes.insert(id, node_state);
        }
    }

    fn viewer_changed(&mut self, viewer: Option<Identity>) {
        if viewer.is_none() {
            // Signed-out viewers can neither reply nor delete.
            self.nodes.retain(|_, s| !matches!(s, NodeState::Replying | NodeState::ConfirmingDelete));
        }
        self.viewer = viewer;
    }
}

/// Point-in-time copy of a section, ready to render.
#[derive(Debug, Clone)]
pub struct SectionSnapshot {
    pub article_key: String,
    pub status: LoadStatus,
    pub viewer: Option<Identity>,
    pub tree: Vec<CommentNode>,
    /// Number of stored comments, deleted ones included
    pub total: usize,
    nodes: HashMap<CommentId, NodeState>,
    collapsed: BTreeSet<CommentId>,
}

impl SectionSnapshot {
    /// A snapshot with every node idle, for rendering a tree that did not
    /// come from a mounted section.
    pub fn from_parts(
        article_key: impl Into<String>,
        status: LoadStatus,
        viewer: Option<Identity>,
        tree: Vec<CommentNode>,
        collapsed: impl IntoIterator<Item = CommentId>,
    ) -> Self {
        Self {
            article_key: article_key.into(),
            status,
            viewer,
            total: count_nodes(&tree),
            tree,
            nodes: HashMap::new(),
            collapsed: collapsed.into_iter().collect(),
        }
    }

    /// The rows this snapshot's viewer may see, in display order.
    pub fn rows(&self) -> Vec<ThreadRow> {
        plan_collapsed(&self.tree, self.viewer.as_ref(), &self.collapsed)
    }

    pub fn is_collapsed(&self, id: CommentId) -> bool {
        self.collapsed.contains(&id)
    }

    /// Collapsed threads in id order.
    pub fn collapsed(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.collapsed.iter().copied()
    }

    pub fn node_state(&self, id: CommentId) -> NodeState {
        self.nodes.get(&id).copied().unwrap_or_default()
    }

    pub fn find(&self, id: CommentId) -> Option<&CommentNode> {
        self.tree.iter().find_map(|root| root.find(id))
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// The comment thread of one essay, bound to a store and an identity source.
///
/// Mounting subscribes to identity changes; dropping the section releases
/// that subscription.
pub struct CommentSection {
    store: Arc<dyn CommentStore>,
    identity: Arc<dyn IdentityService>,
    article_key: String,
    issued: AtomicU64,
    state: Arc<Mutex<SectionState>>,
    _identity_changes: Subscription,
}

impl CommentSection {
    pub fn mount(
        store: Arc<dyn CommentStore>,
        identity: Arc<dyn IdentityService>,
        article_key: impl Into<String>,
    ) -> Self {
        let state = Arc::new(Mutex::new(SectionState::new(identity.current_user())));
        let weak = Arc::downgrade(&state);
        let subscription = identity.on_change(Box::new(move |viewer| {
            if let Some(state) = weak.upgrade() {
                state.lock().viewer_changed(viewer);
            }
        }));

        Self {
            store,
            identity,
            article_key: article_key.into(),
            issued: AtomicU64::new(0),
            state,
            _identity_changes: subscription,
        }
    }

    pub fn article_key(&self) -> &str {
        &self.article_key
    }

    /// Fetches every comment of the article and replaces the displayed tree.
    ///
    /// A store failure leaves an empty, `Unavailable` section instead of an error.
    pub async fn load(&self) -> LoadOutcome {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.store.list(&self.article_key).await;
        self.apply_load(generation, result)
    }

    fn apply_load(&self, generation: u64, result: Result<Vec<Comment>>) -> LoadOutcome {
        let mut state = self.state.lock();
        if generation <= state.applied {
            tracing::debug!(
                article = %self.article_key,
                generation,
                applied = state.applied,
                "discarding stale comment load"
            );
            return LoadOutcome::Stale;
        }
        state.applied = generation;
        // Read under the state lock: a sign-out during the fetch either shows
        // up here or reaches the listener after this load is applied.
        state.viewer_changed(self.identity.current_user());

        match result {
            Ok(comments) => {
                state.total = comments.len();
                state.tree = build_tree(&comments);
                state.status = LoadStatus::Ready;
                let SectionState { tree, nodes, collapsed, .. } = &mut *state;
                nodes.retain(|id, _| tree.iter().any(|root| root.find(*id).is_some()));
                collapsed.retain(|id| tree.iter().any(|root| root.find(*id).is_some()));
            }
            Err(err) => {
                tracing::warn!(article = %self.article_key, error = %err, "failed to load comments");
                state.total = 0;
                state.tree.clear();
                state.nodes.clear();
                state.status = LoadStatus::Unavailable(err.user_message());
            }
        }
        LoadOutcome::Applied
    }

    pub fn snapshot(&self) -> SectionSnapshot {
        let state = self.state.lock();
        SectionSnapshot {
            article_key: self.article_key.clone(),
            status: state.status.clone(),
            viewer: state.viewer.clone(),
            tree: state.tree.clone(),
            total: state.total,
            nodes: state.nodes.clone(),
            collapsed: state.collapsed.clone(),
        }
    }

    pub fn node_state(&self, id: CommentId) -> NodeState {
        self.state.lock().node_state(id)
    }

    /// Posts a new top-level comment, then refetches.
    pub async fn submit_root(&self, content: &str) -> Result<CommentId> {
        let (author, body) = self.precheck(content)?;
        let inserted = self
            .store
            .insert(NewComment {
                content: body,
                author_id: author.id,
                author_display: author.display_label,
                article_key: self.article_key.clone(),
                parent_id: None,
            })
            .await
            .inspect_err(|err| {
                tracing::warn!(article = %self.article_key, error = %err, "failed to post comment")
            })?;

        tracing::info!(article = %self.article_key, comment = %inserted.id, "comment posted");
        self.load().await;
        Ok(inserted.id)
    }

    /// Folds the thread under `id`. Comments without replies have nothing to fold.
    pub fn collapse(&self, id: CommentId) -> Result<()> {
        let mut state = self.state.lock();
        let node = state.find(id).ok_or_else(|| DomainError::not_found("comment", id))?;
        if !node.children.is_empty() {
            state.collapsed.insert(id);
        }
        Ok(())
    }

    pub fn expand(&self, id: CommentId) {
        self.state.lock().collapsed.remove(&id);
    }

    /// Opens the reply form under `parent`.
    pub fn begin_reply(&self, parent: CommentId) -> Result<()> {
        if self.identity.current_user().is_none() {
            return Err(DomainError::NotAuthenticated);
        }
        let mut state = self.state.lock();
        let node = state.find(parent).ok_or_else(|| DomainError::not_found("comment", parent))?;
        if node.comment.is_deleted {
            return Err(DomainError::validation("Deleted comments cannot be replied to."));
        }
        match state.node_state(parent) {
            NodeState::Idle | NodeState::Replying => {
                state.set_node_state(parent, NodeState::Replying);
                Ok(())
            }
            _ => Err(DomainError::validation("This comment is busy, please wait.")),
        }
    }

    pub fn cancel_reply(&self, parent: CommentId) {
        let mut state = self.state.lock();
        if state.node_state(parent) == NodeState::Replying {
            state.set_node_state(parent, NodeState::Idle);
        }
    }

    /// Posts a reply under `parent`, then refetches.
    ///
    /// Rejected without touching the store when signed out or when `content`
    /// is blank.
    pub async fn submit_reply(&self, parent: CommentId, content: &str) -> Result<CommentId> {
        let (author, body) = self.precheck(content)?;
        self.state.lock().set_node_state(parent, NodeState::Submitting);

        let result = self
            .store
            .insert(NewComment {
                content: body,
                author_id: author.id,
                author_display: author.display_label,
                article_key: self.article_key.clone(),
                parent_id: Some(parent),
            })
            .await;

        match result {
            Ok(inserted) => {
                self.state.lock().set_node_state(parent, NodeState::Idle);
                tracing::info!(
                    article = %self.article_key,
                    comment = %inserted.id,
                    parent = %parent,
                    "reply posted"
                );
                self.load().await;
                Ok(inserted.id)
            }
            Err(err) => {
                self.state.lock().set_node_state(parent, NodeState::Replying);
                tracing::warn!(article = %self.article_key, parent = %parent, error = %err, "failed to post reply");
                Err(err)
            }
        }
    }

    /// First half of a soft delete: asks for confirmation.
    pub fn request_delete(&self, id: CommentId) -> Result<()> {
        if self.identity.current_user().is_none() {
            return Err(DomainError::NotAuthenticated);
        }
        let mut state = self.state.lock();
        let node = state.find(id).ok_or_else(|| DomainError::not_found("comment", id))?;
        if node.comment.is_deleted {
            return Err(DomainError::validation("This comment has already been deleted."));
        }
        match state.node_state(id) {
            NodeState::Idle | NodeState::ConfirmingDelete => {
                state.set_node_state(id, NodeState::ConfirmingDelete);
                Ok(())
            }
            _ => Err(DomainError::validation("This comment is busy, please wait.")),
        }
    }

    pub fn cancel_delete(&self, id: CommentId) {
        let mut state = self.state.lock();
        if state.node_state(id) == NodeState::ConfirmingDelete {
            state.set_node_state(id, NodeState::Idle);
        }
    }

    /// Second half of a soft delete. The store decides whether the viewer
    /// may delete; on failure the comment is left exactly as it was.
    pub async fn confirm_delete(&self, id: CommentId) -> Result<()> {
        let Some(actor) = self.identity.current_user() else {
            self.state.lock().set_node_state(id, NodeState::Idle);
            return Err(DomainError::NotAuthenticated);
        };
        {
            let mut state = self.state.lock();
            if state.node_state(id) != NodeState::ConfirmingDelete {
                return Err(DomainError::validation("Deletion must be confirmed first."));
            }
            state.set_node_state(id, NodeState::Deleting);
        }

        let result = self.store.mark_deleted(id, actor.id).await;
        self.state.lock().set_node_state(id, NodeState::Idle);
        match result {
            Ok(()) => {
                tracing::info!(article = %self.article_key, comment = %id, "comment deleted");
                self.load().await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(article = %self.article_key, comment = %id, error = %err, "failed to delete comment");
                Err(err)
            }
        }
    }

    fn precheck(&self, content: &str) -> Result<(Identity, String)> {
        let author = self.identity.current_user().ok_or(DomainError::NotAuthenticated)?;
        let body = content.trim();
        if body.is_empty() {
            return Err(DomainError::validation("Comments cannot be empty."));
        }
        Ok((author, body.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityCell;
    use chrono::Utc;
    use domains::{MockCommentStore, UserId};

    fn ada() -> Identity {
        Identity { id: UserId::new(), display_label: "ada".into() }
    }

    fn root(author: &Identity) -> Comment {
        Comment {
            id: CommentId::new(),
            content: "hello".into(),
            author_id: author.id,
            author_display: author.display_label.clone(),
            article_key: "essay".into(),
            parent_id: None,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    fn section(store: MockCommentStore, cell: &IdentityCell) -> CommentSection {
        CommentSection::mount(Arc::new(store), Arc::new(cell.clone()), "essay")
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let author = ada();
        let cell = IdentityCell::new(Some(author.clone()));
        let section = section(MockCommentStore::new(), &cell);

        let newer = vec![root(&author), root(&author)];
        let older = vec![root(&author)];
        assert_eq!(section.apply_load(2, Ok(newer)), LoadOutcome::Applied);
        assert_eq!(section.apply_load(1, Ok(older)), LoadOutcome::Stale);

        assert_eq!(section.snapshot().total, 2);
    }

    #[test]
    fn test_failed_load_shows_empty_state() {
        let author = ada();
        let cell = IdentityCell::new(None);
        let section = section(MockCommentStore::new(), &cell);

        section.apply_load(1, Ok(vec![root(&author)]));
        section.apply_load(2, Err(DomainError::unavailable("connection refused")));

        let snapshot = section.snapshot();
        assert!(snapshot.is_empty());
        assert!(matches!(snapshot.status, LoadStatus::Unavailable(_)));
    }

    #[test]
    fn test_sign_out_closes_reply_form() {
        let author = ada();
        let comment = root(&author);
        let id = comment.id;
        let cell = IdentityCell::new(Some(author));
        let section = section(MockCommentStore::new(), &cell);
        section.apply_load(1, Ok(vec![comment]));

        section.begin_reply(id).unwrap();
        assert_eq!(section.node_state(id), NodeState::Replying);

        cell.set(None);
        assert_eq!(section.node_state(id), NodeState::Idle);
        assert!(section.snapshot().viewer.is_none());
    }

    #[test]
    fn test_dropping_section_releases_subscription() {
        let cell = IdentityCell::new(None);
        let section = section(MockCommentStore::new(), &cell);
        assert_eq!(cell.listener_count(), 1);
        drop(section);
        assert_eq!(cell.listener_count(), 0);
    }

    #[test]
    fn test_confirm_without_request_is_rejected() {
        let author = ada();
        let comment = root(&author);
        let id = comment.id;
        let cell = IdentityCell::new(Some(author));
        let mut store = MockCommentStore::new();
        store.expect_mark_deleted().never();
        let section = section(store, &cell);
        section.apply_load(1, Ok(vec![comment]));

        let err = tokio_test::block_on(section.confirm_delete(id)).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[test]
    fn test_collapse_folds_only_threads_with_replies() {
        let author = ada();
        let parent = root(&author);
        let mut reply = root(&author);
        reply.parent_id = Some(parent.id);
        let lonely = root(&author);
        let (parent_id, reply_id, lonely_id) = (parent.id, reply.id, lonely.id);

        let cell = IdentityCell::new(Some(author));
        let section = section(MockCommentStore::new(), &cell);
        section.apply_load(1, Ok(vec![parent, reply, lonely]));

        section.collapse(parent_id).unwrap();
        section.collapse(lonely_id).unwrap();
        let snapshot = section.snapshot();
        assert!(snapshot.is_collapsed(parent_id));
        assert!(!snapshot.is_collapsed(lonely_id));
        assert_eq!(snapshot.rows().len(), 2);
        assert!(snapshot.find(reply_id).is_some());

        section.expand(parent_id);
        assert_eq!(section.snapshot().rows().len(), 3);
        assert!(matches!(
            section.collapse(CommentId::new()).unwrap_err(),
            DomainError::NotFound(..)
        ));
    }

    #[test]
    fn test_fold_of_vanished_comment_is_pruned() {
        let author = ada();
        let parent = root(&author);
        let mut reply = root(&author);
        reply.parent_id = Some(parent.id);
        let parent_id = parent.id;

        let cell = IdentityCell::new(Some(author.clone()));
        let section = section(MockCommentStore::new(), &cell);
        section.apply_load(1, Ok(vec![parent, reply]));
        section.collapse(parent_id).unwrap();

        section.apply_load(2, Ok(vec![root(&author)]));
        let snapshot = section.snapshot();
        assert!(!snapshot.is_collapsed(parent_id));
        assert_eq!(snapshot.collapsed().count(), 0);
    }
}
