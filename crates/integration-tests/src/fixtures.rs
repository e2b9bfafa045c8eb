use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::{Comment, CommentId, Identity, NewComment, UserId};
use uuid::Uuid;

pub const ARTICLE: &str = "on-margins";

pub fn identity(label: &str) -> Identity {
    Identity { id: UserId::new(), display_label: label.to_string() }
}

/// Fixed origin for generated timestamps.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().unwrap_or_default()
}

/// Stable, human-readable ids for scenario tests: `id(1)`, `id(99)`.
pub fn id(n: u128) -> CommentId {
    CommentId(Uuid::from_u128(n))
}

/// A stored comment `n` posted `minute` minutes after [`t0`].
pub fn comment(n: u128, parent: Option<u128>, minute: i64, author: &Identity) -> Comment {
    Comment {
        id: id(n),
        content: format!("comment {n}"),
        author_id: author.id,
        author_display: author.display_label.clone(),
        article_key: ARTICLE.to_string(),
        parent_id: parent.map(id),
        created_at: t0() + Duration::minutes(minute),
        is_deleted: false,
    }
}

pub fn new_comment(author: &Identity, article: &str, parent: Option<CommentId>, content: &str) -> NewComment {
    NewComment {
        content: content.to_string(),
        author_id: author.id,
        author_display: author.display_label.clone(),
        article_key: article.to_string(),
        parent_id: parent,
    }
}

/// Writes an `.mdx` essay with front matter into `dir`.
pub fn write_essay(dir: &Path, slug: &str, title: &str, category: &str, date: &str, featured: bool) {
    let body = format!(
        "---\ntitle: {title}\ncategory: {category}\nauthor: Redazione\ndate: {date}\nexcerpt: About {title}.\nfeatured: {featured}\n---\n\nFirst paragraph of {title}.\n\nSecond paragraph.\n"
    );
    std::fs::write(dir.join(format!("{slug}.mdx")), body).expect("write essay fixture");
}
