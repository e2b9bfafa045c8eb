use std::collections::HashSet;

use chrono::Duration;
use domains::{Comment, CommentId, CommentNode, UserId};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::FirstName;
use fake::Fake;
use integration_tests::fixtures::{comment, id, identity, t0, ARTICLE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use services::build_tree;
use services::thread::count_nodes;
use uuid::Uuid;

/// A chronologically sorted thread where each comment replies to an
/// earlier one, starts a new root, or points at a comment that is gone.
fn random_thread(rng: &mut StdRng) -> Vec<Comment> {
    let len = rng.gen_range(0..60);
    let mut comments: Vec<Comment> = Vec::with_capacity(len);
    let mut elapsed = 0;
    for i in 0..len {
        // Equal timestamps are allowed; the store orders those by insertion.
        elapsed += rng.gen_range(0..120);
        let parent = match rng.gen_range(0..10) {
            0..=2 => None,
            3 => Some(CommentId(Uuid::from_u128(rng.gen::<u128>() | (1u128 << 127)))),
            _ if !comments.is_empty() => Some(comments[rng.gen_range(0..comments.len())].id),
            _ => None,
        };
        let author: String = FirstName().fake_with_rng(rng);
        comments.push(Comment {
            id: CommentId(Uuid::from_u128(i as u128 + 1)),
            content: Sentence(3..12).fake_with_rng(rng),
            author_id: UserId::new(),
            author_display: author,
            article_key: ARTICLE.to_string(),
            parent_id: parent,
            created_at: t0() + Duration::seconds(elapsed),
            is_deleted: rng.gen_bool(0.1),
        });
    }
    comments
}

fn collect_ids(forest: &[CommentNode], out: &mut Vec<CommentId>) {
    for node in forest {
        out.push(node.comment.id);
        collect_ids(&node.children, out);
    }
}

fn assert_children_sorted(forest: &[CommentNode]) {
    for node in forest {
        assert!(
            node.children
                .windows(2)
                .all(|pair| pair[0].comment.created_at <= pair[1].comment.created_at),
            "children of {} are out of order",
            node.comment.id
        );
        assert_children_sorted(&node.children);
    }
}

#[test]
fn test_random_threads_keep_every_comment_once() {
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let comments = random_thread(&mut rng);
        let forest = build_tree(&comments);

        assert_eq!(count_nodes(&forest), comments.len(), "seed {seed}");

        let mut ids = Vec::new();
        collect_ids(&forest, &mut ids);
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), comments.len(), "seed {seed}: duplicated node");
        assert_children_sorted(&forest);
    }
}

#[test]
fn test_build_tree_is_deterministic() {
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let comments = random_thread(&mut rng);
        let first = build_tree(&comments);
        let second = build_tree(&comments);
        assert_eq!(first, second, "seed {seed}");
    }
}

#[test]
fn test_unknown_parents_become_roots() {
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let comments = random_thread(&mut rng);
        let known: HashSet<CommentId> = comments.iter().map(|c| c.id).collect();
        let forest = build_tree(&comments);
        let roots: HashSet<CommentId> = forest.iter().map(|n| n.comment.id).collect();

        for comment in &comments {
            let orphan = comment.parent_id.map_or(true, |p| !known.contains(&p));
            assert_eq!(roots.contains(&comment.id), orphan, "seed {seed}: {}", comment.id);
        }
    }
}

#[test]
fn test_scenario_with_orphan() {
    let ada = identity("ada");
    let comments = vec![
        comment(1, None, 0, &ada),
        comment(2, Some(1), 1, &ada),
        comment(3, Some(1), 2, &ada),
        comment(4, Some(99), 3, &ada),
    ];

    let forest = build_tree(&comments);

    let roots: Vec<_> = forest.iter().map(|n| n.comment.id).collect();
    assert_eq!(roots, vec![id(1), id(4)]);
    let children: Vec<_> = forest[0].children.iter().map(|n| n.comment.id).collect();
    assert_eq!(children, vec![id(2), id(3)]);
    assert!(forest[1].children.is_empty());
}
