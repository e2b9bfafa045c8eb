//! Rebuilds the reply tree from the flat comment list.

use std::collections::HashMap;

use domains::{Comment, CommentId, CommentNode};

/// Turns comments (oldest first) into an ordered forest of reply trees.
///
/// Runs in O(n). Children keep input order, so they stay chronological when
/// the input is. A comment whose parent is missing from `comments` becomes a
/// root. Nothing is dropped and nothing is duplicated: comments whose parent
/// links loop back on themselves are surfaced as roots after the regular ones.
pub fn build_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let index: HashMap<CommentId, usize> = comments
        .iter()
        .enumerate()
        .map(|(pos, comment)| (comment.id, pos))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();
    for (pos, comment) in comments.iter().enumerate() {
        match comment.parent_id.and_then(|parent| index.get(&parent).copied()) {
            Some(parent) if parent != pos => children[parent].push(pos),
            _ => roots.push(pos),
        }
    }

    let mut slots: Vec<Option<Comment>> = comments.iter().cloned().map(Some).collect();
    let mut forest: Vec<CommentNode> = roots
        .into_iter()
        .filter_map(|pos| assemble(pos, &children, &mut slots))
        .collect();

    // Anything still unclaimed is part of a parent cycle.
    for pos in 0..comments.len() {
        if let Some(node) = assemble(pos, &children, &mut slots) {
            forest.push(node);
        }
    }
    forest
}

fn assemble(
    pos: usize,
    children: &[Vec<usize>],
    slots: &mut [Option<Comment>],
) -> Option<CommentNode> {
    let comment = slots[pos].take()?;
    let mut node = CommentNode::new(comment);
    node.children = children[pos]
        .iter()
        .filter_map(|&child| assemble(child, children, slots))
        .collect();
    Some(node)
}

/// Total number of nodes across a forest.
pub fn count_nodes(forest: &[CommentNode]) -> usize {
    forest.iter().map(CommentNode::subtree_len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use domains::UserId;
    use uuid::Uuid;

    fn id(n: u128) -> CommentId {
        CommentId(Uuid::from_u128(n))
    }

    fn comment(n: u128, parent: Option<u128>, minute: i64) -> Comment {
        Comment {
            id: id(n),
            content: format!("comment {n}"),
            author_id: UserId(Uuid::from_u128(1000)),
            author_display: "ada".into(),
            article_key: "essay".into(),
            parent_id: parent.map(id),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minute),
            is_deleted: false,
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<CommentId> {
        nodes.iter().map(|n| n.comment.id).collect()
    }

    #[test]
    fn test_orphan_becomes_root() {
        let forest = build_tree(&[
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(1), 2),
            comment(4, Some(99), 3),
        ]);

        assert_eq!(ids(&forest), vec![id(1), id(4)]);
        assert_eq!(ids(&forest[0].children), vec![id(2), id(3)]);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(build_tree(&[]).is_empty());
    }

    #[test]
    fn test_deleted_parent_keeps_children() {
        let mut parent = comment(1, None, 0);
        parent.is_deleted = true;
        let forest = build_tree(&[parent, comment(2, Some(1), 1)]);

        assert_eq!(forest.len(), 1);
        assert!(forest[0].comment.is_deleted);
        assert_eq!(ids(&forest[0].children), vec![id(2)]);
    }

    #[test]
    fn test_parent_cycle_loses_nothing() {
        let forest = build_tree(&[
            comment(1, None, 0),
            comment(2, Some(3), 1),
            comment(3, Some(2), 2),
            comment(4, Some(4), 3),
        ]);

        assert_eq!(count_nodes(&forest), 4);
        assert_eq!(ids(&forest), vec![id(1), id(4), id(2)]);
        assert_eq!(ids(&forest[2].children), vec![id(3)]);
    }
}
